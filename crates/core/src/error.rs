//! Error types shared across the Readwise gateway.

use serde::{Deserialize, Serialize};

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error types that can occur while serving a gateway request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Inbound request failed the bearer-token check.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller-supplied parameters failed validation before any backend call.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Backend throttled the request.
    #[error("backend rate limited, retry after {retry_after_secs:?} seconds")]
    BackendRateLimited { retry_after_secs: Option<u64> },

    /// Backend was unreachable, timed out, or failed server-side.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend understood the request and refused it.
    #[error("backend rejected the request (status {status}): {message}")]
    BackendRejected { status: u16, message: String },
}

impl GatewayError {
    /// Check if the failed operation can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendRateLimited { .. } | Self::BackendUnavailable(_)
        )
    }

    /// Stable wire classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidParameters(_) => ErrorKind::InvalidParameters,
            Self::BackendRateLimited { .. } => ErrorKind::BackendRateLimited,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::BackendRejected { .. } => ErrorKind::BackendRejected,
        }
    }

    /// Retry-after hint in seconds, when the backend provided one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::BackendRateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }

    /// Map a non-success backend status to a gateway error.
    ///
    /// Messages are built here rather than copied from the response body,
    /// so upstream error text never reaches a caller.
    pub fn from_status(status: u16, retry_after_secs: Option<u64>) -> Self {
        match status {
            429 => Self::BackendRateLimited { retry_after_secs },
            s if s >= 500 => Self::BackendUnavailable(format!("backend returned status {s}")),
            401 | 403 => Self::BackendRejected {
                status,
                message: "backend authentication failed".to_string(),
            },
            404 => Self::BackendRejected {
                status,
                message: "resource not found".to_string(),
            },
            s => Self::BackendRejected {
                status: s,
                message: "backend rejected the request".to_string(),
            },
        }
    }
}

/// Wire-level error classification reported to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    InvalidParameters,
    BackendRateLimited,
    BackendUnavailable,
    BackendRejected,
    /// A fetch-all walk stopped early; the payload carries what was collected.
    PartialResult,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidParameters => "invalid_parameters",
            Self::BackendRateLimited => "backend_rate_limited",
            Self::BackendUnavailable => "backend_unavailable",
            Self::BackendRejected => "backend_rejected",
            Self::PartialResult => "partial_result",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_rate_limited() {
        let err = GatewayError::from_status(429, Some(30));
        assert_eq!(
            err,
            GatewayError::BackendRateLimited {
                retry_after_secs: Some(30)
            }
        );
        assert!(err.is_retryable());
        assert_eq!(err.retry_after_secs(), Some(30));
    }

    #[test]
    fn test_from_status_server_errors_are_retryable() {
        for status in [500, 502, 503, 504] {
            let err = GatewayError::from_status(status, None);
            assert!(matches!(err, GatewayError::BackendUnavailable(_)));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_from_status_client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404, 409] {
            let err = GatewayError::from_status(status, None);
            assert!(matches!(
                err,
                GatewayError::BackendRejected { status: s, .. } if s == status
            ));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_invalid_parameters_not_retryable() {
        let err = GatewayError::InvalidParameters("limit must be >= 1".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ErrorKind::Unauthorized.as_str(), "unauthorized");
        assert_eq!(ErrorKind::InvalidParameters.as_str(), "invalid_parameters");
        assert_eq!(
            ErrorKind::BackendRateLimited.as_str(),
            "backend_rate_limited"
        );
        assert_eq!(
            ErrorKind::BackendUnavailable.as_str(),
            "backend_unavailable"
        );
        assert_eq!(ErrorKind::BackendRejected.as_str(), "backend_rejected");
        assert_eq!(ErrorKind::PartialResult.as_str(), "partial_result");
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&ErrorKind::BackendRateLimited).unwrap();
        assert_eq!(json, "\"backend_rate_limited\"");
        let kind: ErrorKind = serde_json::from_str("\"partial_result\"").unwrap();
        assert_eq!(kind, ErrorKind::PartialResult);
    }
}
