//! Offer classification by category path levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Level, OfferClassification, CATEGORY_PATH_SEP};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::CategoryTree;

/// What [`OfferClassifier::classify`] does when a category has fewer than
/// three levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShallowPolicy {
    /// Missing levels become empty strings
    #[default]
    Empty,
    /// Missing levels fail with [`DomainError::IndexOutOfRange`]
    Reject,
}

impl FromStr for ShallowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(Self::Empty),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown shallow category policy: {other} (expected empty|reject)"
            )),
        }
    }
}

impl fmt::Display for ShallowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Stateless classifier over a shared, read-only [`CategoryTree`].
#[derive(Debug, Clone, Copy)]
pub struct OfferClassifier<'t> {
    tree: &'t CategoryTree,
    policy: ShallowPolicy,
}

impl<'t> OfferClassifier<'t> {
    pub fn new(tree: &'t CategoryTree, policy: ShallowPolicy) -> Self {
        Self { tree, policy }
    }

    /// Segment of the category path at `level`.
    ///
    /// Ranks beyond the depth of the category are always an error here; the
    /// shallow policy only applies to [`classify`](Self::classify).
    pub fn nth_segment(&self, category_id: &str, level: Level) -> DomainResult<String> {
        let category = self.tree.lookup(category_id)?;
        let segments = category.segments();
        segment_at(category_id, &segments, level)
    }

    /// Levels 1-3 and the remainder from a single split of the path.
    pub fn classify(&self, category_id: &str) -> DomainResult<OfferClassification> {
        let category = self.tree.lookup(category_id)?;
        let segments = category.segments();

        let level = |level: Level| match segment_at(category_id, &segments, level) {
            Err(DomainError::IndexOutOfRange { .. }) if self.policy == ShallowPolicy::Empty => {
                Ok(String::new())
            }
            other => other,
        };

        Ok(OfferClassification {
            level1: level(Level::ONE)?,
            level2: level(Level::TWO)?,
            level3: level(Level::THREE)?,
            remainder: level(Level::Remainder)?,
        })
    }
}

/// Look up `level` in already split path segments.
fn segment_at(category_id: &str, segments: &[&str], level: Level) -> DomainResult<String> {
    match level {
        Level::Remainder => Ok(segments
            .iter()
            .skip(Level::FIXED_DEPTH)
            .copied()
            .collect::<Vec<_>>()
            .join(CATEGORY_PATH_SEP)),
        Level::Rank(rank) => rank
            .checked_sub(1)
            .and_then(|idx| segments.get(idx))
            .map(|segment| segment.to_string())
            .ok_or_else(|| DomainError::IndexOutOfRange {
                id: category_id.to_string(),
                level: rank,
                depth: segments.len(),
            }),
    }
}

/// Segment of `category_id`'s path at `level`, failing on out-of-range ranks.
pub fn nth_segment(category_id: &str, level: Level, tree: &CategoryTree) -> DomainResult<String> {
    OfferClassifier::new(tree, ShallowPolicy::Reject).nth_segment(category_id, level)
}

/// Classify `category_id`, failing if the category has fewer than three levels.
pub fn classify(category_id: &str, tree: &CategoryTree) -> DomainResult<OfferClassification> {
    OfferClassifier::new(tree, ShallowPolicy::Reject).classify(category_id)
}
