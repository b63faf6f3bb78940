//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Rejected command line; clap's rendering already carries the usage hint.
    #[error("{0}")]
    InvalidArgs(#[from] clap::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Internal(_) => crate::exitcode::SOFTWARE,
            CliError::Application(e) => match e {
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                ApplicationError::WorkerPanicked { .. } => crate::exitcode::SOFTWARE,
            },
        }
    }
}
