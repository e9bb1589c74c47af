//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{CatalogService, IngestService};
use crate::config::Settings;
use crate::infrastructure::feed::XmlFeed;
use crate::infrastructure::traits::FeedSource;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Feed document abstraction
    pub feed: Arc<dyn FeedSource>,
}

impl ServiceContainer {
    /// Create a new service container reading the feed at `feed_path`.
    pub fn new(settings: Settings, feed_path: PathBuf) -> Self {
        Self::with_deps(settings, Arc::new(XmlFeed::new(feed_path)))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, feed: Arc<dyn FeedSource>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, feed }
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(Arc::clone(&self.feed))
    }

    pub fn ingest_service(&self) -> IngestService {
        IngestService::new(Arc::clone(&self.feed), Arc::clone(&self.settings))
    }
}
