//! Domain layer: category model, tree resolution and offer classification
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod classifier;
pub mod entities;
pub mod error;
pub mod offer;
pub mod tree;

pub use builder::{build_category_tree, CategoryTreeBuilder};
pub use classifier::{classify, nth_segment, OfferClassifier, ShallowPolicy};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use offer::{FieldMapping, OfferField, OfferRecord};
pub use tree::CategoryTree;
