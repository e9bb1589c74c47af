//! Feed ingestion service
//!
//! Builds the category tree once, then streams offers through assembly into
//! an [`OfferSink`].

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::services::assembler::{AssemblyOutcome, OfferAssembler};
use crate::application::services::catalog::CatalogService;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::OfferClassifier;
use crate::infrastructure::traits::{FeedSource, OfferSink};

/// Counters of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Categories in the resolved tree
    pub categories: usize,
    /// Offers read from the feed
    pub offers: usize,
    /// Records handed to the sink
    pub written: usize,
    /// Offers dropped for an unknown category
    pub skipped: usize,
    /// Offers dropped for a shallow category
    pub rejected: usize,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} categories, {} offers: {} written, {} skipped, {} rejected",
            self.categories, self.offers, self.written, self.skipped, self.rejected
        )
    }
}

/// Service running a complete feed ingestion.
pub struct IngestService {
    feed: Arc<dyn FeedSource>,
    settings: Arc<Settings>,
}

impl IngestService {
    pub fn new(feed: Arc<dyn FeedSource>, settings: Arc<Settings>) -> Self {
        Self { feed, settings }
    }

    /// Ingest the whole feed into `sink`.
    ///
    /// Offers dropped by a classification policy are counted and logged;
    /// the run only stops on feed or sink I/O errors, or on an unknown
    /// category under the `abort` policy.
    #[instrument(level = "info", skip_all, fields(feed = %self.feed.location().display()))]
    pub fn run(&self, sink: &mut dyn OfferSink) -> ApplicationResult<IngestReport> {
        let tree = CatalogService::new(Arc::clone(&self.feed)).load_tree()?;
        info!("resolved {} categories", tree.len());

        let classification = self.settings.classification;
        let classifier = OfferClassifier::new(&tree, classification.shallow_categories);
        let assembler = OfferAssembler::new(
            classifier,
            &self.settings.mapping,
            classification.unknown_category,
            self.settings.marketplace_id,
        );

        let mut report = IngestReport {
            categories: tree.len(),
            ..IngestReport::default()
        };

        let offers = self
            .feed
            .offers()
            .with_path_context("open offers", self.feed.location())?;

        for offer in offers {
            let offer = offer.with_path_context("read offer", self.feed.location())?;
            report.offers += 1;

            match assembler.assemble(offer)? {
                AssemblyOutcome::Ready(record) => {
                    sink.write(&record).with_context("write offer record")?;
                    report.written += 1;
                }
                AssemblyOutcome::Skipped(reason) => {
                    debug!("skipping offer #{}: {}", report.offers, reason);
                    report.skipped += 1;
                }
                AssemblyOutcome::Rejected(reason) => {
                    warn!("rejecting offer #{}: {}", report.offers, reason);
                    report.rejected += 1;
                }
            }

            let every = self.settings.progress_every;
            if every > 0 && report.offers as u64 % every == 0 {
                info!("processed {} offers ({} written)", report.offers, report.written);
            }
        }

        sink.flush().with_context("flush offer records")?;
        info!("ingestion finished: {}", report);
        Ok(report)
    }
}
