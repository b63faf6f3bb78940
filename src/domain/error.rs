//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors describe input the traversal refuses to process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Tree deeper than the configured guard; the only malformed-input kind.
    #[error("malformed input: tree exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },
}
