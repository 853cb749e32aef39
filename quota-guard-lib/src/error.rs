use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Machine-readable code carried by every rate-limit rejection.
pub const RATE_LIMIT_CODE: &str = "GA4_RATE_LIMIT";

/// Raised by the rate guard when a key has used up its window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Rate limit exceeded for {key} (limit: {limit}, retry after {retry_after:?})")]
pub struct RateLimitExceeded {
    pub key: String,
    pub limit: u32,
    pub retry_after: Duration,
}

impl RateLimitExceeded {
    pub fn code(&self) -> &'static str {
        RATE_LIMIT_CODE
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }
}

/// Errors that can occur in the quota guard
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl GuardError {
    /// HTTP status the network-facing layer should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::RateLimited(e) => e.status(),
            GuardError::Json(_) => StatusCode::BAD_REQUEST,
            GuardError::Io(_) | GuardError::Config(_) | GuardError::Telemetry(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_error_carries_code_and_status() {
        let err = RateLimitExceeded {
            key: "t1:p1".to_string(),
            limit: 3,
            retry_after: Duration::from_secs(1),
        };
        assert_eq!(err.code(), "GA4_RATE_LIMIT");
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);

        let wrapped: GuardError = err.into();
        assert_eq!(wrapped.status().as_u16(), 429);
    }
}
