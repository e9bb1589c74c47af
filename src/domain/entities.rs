//! Domain entities: core data structures

use std::fmt;

use serde::Serialize;

use crate::domain::error::DomainError;

/// Separator between the names of a category path.
pub const CATEGORY_PATH_SEP: &str = "/";

/// Category as it appears in the feed, before its path is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCategory {
    pub id: String,
    /// Empty for root categories
    pub parent_id: String,
    pub name: String,
}

impl RawCategory {
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
        }
    }
}

/// Category with its fully-qualified path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    /// Names from the root ancestor down to this category, joined with `/`
    pub path: String,
}

impl Category {
    /// Path split into its names, root first.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split(CATEGORY_PATH_SEP).collect()
    }

    /// Number of names in the path.
    pub fn depth(&self) -> usize {
        self.path.split(CATEGORY_PATH_SEP).count()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Position in a category path used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// 1-based rank into the path segments
    Rank(usize),
    /// Everything after the first three segments
    Remainder,
}

impl Level {
    pub const ONE: Level = Level::Rank(1);
    pub const TWO: Level = Level::Rank(2);
    pub const THREE: Level = Level::Rank(3);

    /// Number of fixed levels preceding the remainder.
    pub const FIXED_DEPTH: usize = 3;
}

impl TryFrom<i64> for Level {
    type Error = DomainError;

    /// Legacy integer form: positive rank, or `-1` for the remainder.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Level::Remainder),
            n if n > 0 => usize::try_from(n)
                .map(Level::Rank)
                .map_err(|_| DomainError::InvalidLevel(value)),
            _ => Err(DomainError::InvalidLevel(value)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Rank(n) => write!(f, "{}", n),
            Level::Remainder => write!(f, "remainder"),
        }
    }
}

/// Classification of an offer by its leaf category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OfferClassification {
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub remainder: String,
}

/// Offer as read from the feed: direct children in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOffer {
    /// `id` attribute of the offer element
    pub id: Option<String>,
    /// `(tag, text)` of every child element except `<param>`
    pub fields: Vec<(String, String)>,
    /// `(name, value)` of every `<param>` child
    pub params: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_legacy_minus_one_when_converting_then_remainder() {
        assert_eq!(Level::try_from(-1).unwrap(), Level::Remainder);
        assert_eq!(Level::try_from(2).unwrap(), Level::TWO);
    }

    #[test]
    fn given_zero_or_other_negative_when_converting_then_invalid_level() {
        assert_eq!(Level::try_from(0), Err(DomainError::InvalidLevel(0)));
        assert_eq!(Level::try_from(-3), Err(DomainError::InvalidLevel(-3)));
    }

    #[test]
    fn given_category_when_depth_then_counts_segments() {
        let category = Category {
            id: "3".into(),
            parent_id: "2".into(),
            name: "Dolls".into(),
            path: "Kids/Girls/Dolls".into(),
        };
        assert_eq!(category.depth(), 3);
        assert_eq!(category.segments(), vec!["Kids", "Girls", "Dolls"]);
        assert_eq!(category.to_string(), "Kids/Girls/Dolls");
    }
}
