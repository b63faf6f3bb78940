//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::application::comparator::Side;
use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{side} traversal panicked")]
    WorkerPanicked { side: Side },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
