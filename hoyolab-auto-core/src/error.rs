//! Unified error type definition

use thiserror::Error;

// Re-export library error type
pub use hoyolab_auto_api::ApiError;

/// Core layer error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Ledger persistence failure. Fatal for a run: results must not be
    /// reported as handled when the record preventing duplicate future
    /// attempts could not be saved.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid roster or run configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// The run was cancelled before it could complete.
    #[error("Run aborted: {0}")]
    Aborted(String),

    /// API error (converted from the client library)
    #[error("{0}")]
    Api(#[from] ApiError),
}

impl CoreError {
    /// Whether this is expected behavior (backend refusal, stale cookie)
    /// rather than an infrastructure fault, for log level selection.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Api(e) => e.is_expected(),
            Self::Aborted(_) => true,
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
