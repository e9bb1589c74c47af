//! Category catalog service
//!
//! Reads the category section of a feed and resolves it into a tree.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{CategoryTree, CategoryTreeBuilder};
use crate::infrastructure::traits::FeedSource;

/// Service for loading the category tree of a feed.
pub struct CatalogService {
    feed: Arc<dyn FeedSource>,
}

impl CatalogService {
    pub fn new(feed: Arc<dyn FeedSource>) -> Self {
        Self { feed }
    }

    /// Read all categories of the feed and resolve their paths.
    #[instrument(level = "debug", skip(self), fields(feed = %self.feed.location().display()))]
    pub fn load_tree(&self) -> ApplicationResult<CategoryTree> {
        let raw = self
            .feed
            .read_categories()
            .with_path_context("read categories", self.feed.location())?;
        debug!("load_tree: {} raw categories", raw.len());

        let tree = raw.into_iter().collect::<CategoryTreeBuilder>().build()?;
        Ok(tree)
    }
}
