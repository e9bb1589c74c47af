//! Offer assembly
//!
//! Turns a raw feed offer into a flattened [`OfferRecord`]: mapped tags,
//! JSON-encoded params and the category classification.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, FieldMapping, OfferClassifier, OfferRecord, RawOffer};

/// What to do with an offer whose category id is not in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Drop the offer
    #[default]
    Skip,
    /// Keep the offer with empty classification columns
    Null,
    /// Stop the ingestion run
    Abort,
}

impl FromStr for UnknownCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "null" => Ok(Self::Null),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown category policy: {other} (expected skip|null|abort)")),
        }
    }
}

impl fmt::Display for UnknownCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Null => write!(f, "null"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Result of assembling one offer.
#[derive(Debug)]
pub enum AssemblyOutcome {
    Ready(Box<OfferRecord>),
    /// Dropped by the unknown-category policy
    Skipped(DomainError),
    /// Dropped because its category is shallower than the policy allows
    Rejected(DomainError),
}

/// Builds offer records from raw feed offers.
pub struct OfferAssembler<'a> {
    classifier: OfferClassifier<'a>,
    mapping: &'a FieldMapping,
    unknown_category: UnknownCategoryPolicy,
    marketplace_id: Option<i64>,
}

impl<'a> OfferAssembler<'a> {
    pub fn new(
        classifier: OfferClassifier<'a>,
        mapping: &'a FieldMapping,
        unknown_category: UnknownCategoryPolicy,
        marketplace_id: Option<i64>,
    ) -> Self {
        Self {
            classifier,
            mapping,
            unknown_category,
            marketplace_id,
        }
    }

    /// Assemble `offer` into a record.
    ///
    /// Mapped tags fill their field on first occurrence; later duplicates are
    /// ignored. Params become the `features` JSON object, later names
    /// overwriting earlier ones.
    ///
    /// # Errors
    ///
    /// Only an unknown category under [`UnknownCategoryPolicy::Abort`], or a
    /// failure to encode the features.
    pub fn assemble(&self, offer: RawOffer) -> ApplicationResult<AssemblyOutcome> {
        let RawOffer { id, fields, params } = offer;
        let mut record = OfferRecord::new(id, self.marketplace_id);

        for (tag, text) in fields {
            if let Some(field) = self.mapping.get(&tag) {
                if !record.set_if_absent(field, text) {
                    trace!("offer {:?}: ignoring repeated <{}>", record.product_id, tag);
                }
            }
        }

        let features: BTreeMap<String, String> = params.into_iter().collect();
        record.features =
            serde_json::to_string(&features).map_err(|e| ApplicationError::OperationFailed {
                context: format!("encode features of offer {:?}", record.product_id),
                source: Box::new(e),
            })?;

        let category_id = record.category_id.clone().filter(|id| !id.is_empty());
        if let Some(category_id) = category_id {
            match self.classifier.classify(&category_id) {
                Ok(classification) => record.apply_classification(classification),
                Err(e @ DomainError::UnknownCategory(_)) => match self.unknown_category {
                    UnknownCategoryPolicy::Skip => return Ok(AssemblyOutcome::Skipped(e)),
                    UnknownCategoryPolicy::Null => {
                        debug!(
                            "offer {:?}: {}, leaving classification empty",
                            record.product_id, e
                        );
                    }
                    UnknownCategoryPolicy::Abort => return Err(e.into()),
                },
                Err(e @ DomainError::IndexOutOfRange { .. }) => {
                    return Ok(AssemblyOutcome::Rejected(e));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(AssemblyOutcome::Ready(Box::new(record)))
    }
}
