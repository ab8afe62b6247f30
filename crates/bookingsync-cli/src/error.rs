//! Binary error types.

use thiserror::Error;

/// Result type for command execution.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced to the user as `error: <message>`.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be read or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A secret reference could not be resolved.
    #[error("secret error: {0}")]
    Secret(String),

    /// A provider could not be constructed.
    #[error("provider error: {0}")]
    Provider(#[from] bookingsync_providers::ProviderError),

    /// The pass failed outright.
    #[error(transparent)]
    Sync(#[from] bookingsync_engine::SyncError),

    /// The pass completed but some bookings or units failed.
    #[error("pass completed with {0} failure(s)")]
    Partial(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracing setup failed.
    #[error(transparent)]
    Tracing(#[from] bookingsync_core::TracingError),
}
