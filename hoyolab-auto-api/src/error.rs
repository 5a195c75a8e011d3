use serde::Serialize;
use thiserror::Error;

/// Unified error type for all HoYoLAB API operations.
///
/// Every variant carries the `endpoint` label of the call that produced it so
/// aggregated reports can point an operator at the failing surface.
///
/// # Retryable Errors
///
/// [`Network`](Self::Network), [`Timeout`](Self::Timeout) and
/// [`RateLimited`](Self::RateLimited) are transient and are retried by the
/// built-in HTTP helper with exponential backoff. Everything else is a
/// business outcome and must never be retried blindly.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// A network-level failure (DNS resolution, connection refused, broken body).
    #[error("[{endpoint}] Network error: {detail}")]
    Network { endpoint: String, detail: String },

    /// The request timed out.
    #[error("[{endpoint}] Request timeout: {detail}")]
    Timeout { endpoint: String, detail: String },

    /// HTTP 429 or equivalent.
    #[error("[{endpoint}] Rate limited")]
    RateLimited {
        endpoint: String,
        /// Suggested wait in seconds, if the backend provided one.
        retry_after: Option<u64>,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("[{endpoint}] Parse error: {detail}")]
    Parse { endpoint: String, detail: String },

    /// The backend answered with a non-success envelope where success was
    /// required (e.g. the community search API). The raw retcode and message
    /// are preserved for diagnostics.
    #[error("[{endpoint}] Backend error {retcode}: {message}")]
    Backend {
        endpoint: String,
        retcode: i64,
        message: String,
    },

    /// The session cookie was rejected.
    #[error("[{endpoint}] Invalid session cookie for uid {uid}")]
    InvalidCookie { endpoint: String, uid: u64 },
}

impl ApiError {
    /// Whether the failure is transient and worth retrying at the transport
    /// layer. Business errors are never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Whether the failure is expected behavior (stale cookie, backend refusal)
    /// rather than an infrastructure problem, for log level selection.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::InvalidCookie { .. })
    }
}

/// Convenience alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> ApiError {
        ApiError::Network {
            endpoint: "test".into(),
            detail: "connection refused".into(),
        }
    }

    #[test]
    fn display_network() {
        assert_eq!(
            network().to_string(),
            "[test] Network error: connection refused"
        );
    }

    #[test]
    fn display_backend() {
        let e = ApiError::Backend {
            endpoint: "redeem".into(),
            retcode: -1071,
            message: "Please log in".into(),
        };
        assert_eq!(e.to_string(), "[redeem] Backend error -1071: Please log in");
    }

    #[test]
    fn retryable_variants() {
        assert!(network().is_retryable());
        assert!(ApiError::Timeout {
            endpoint: "t".into(),
            detail: "20s elapsed".into()
        }
        .is_retryable());
        assert!(ApiError::RateLimited {
            endpoint: "t".into(),
            retry_after: None
        }
        .is_retryable());
        assert!(!ApiError::Parse {
            endpoint: "t".into(),
            detail: "bad json".into()
        }
        .is_retryable());
        assert!(!ApiError::Backend {
            endpoint: "t".into(),
            retcode: -100,
            message: "x".into()
        }
        .is_retryable());
    }

    #[test]
    fn expected_variants() {
        assert!(ApiError::InvalidCookie {
            endpoint: "t".into(),
            uid: 1
        }
        .is_expected());
        assert!(!network().is_expected());
    }
}
