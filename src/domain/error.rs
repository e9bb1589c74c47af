//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the category model.
/// These are independent of feed parsing and persistence concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Walking the parent chain of `id` came back to `repeated`.
    #[error("cycle detected in category hierarchy: {id} (revisits {repeated})")]
    CycleDetected { id: String, repeated: String },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("level {level} out of range for category {id} (depth {depth})")]
    IndexOutOfRange {
        id: String,
        level: usize,
        depth: usize,
    },

    #[error("invalid category level: {0}")]
    InvalidLevel(i64),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
