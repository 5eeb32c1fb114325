use samd_launch_core::MalformedOutputWarning;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider API error: status={status}, body={body}")]
    Api { status: u16, body: String },

    #[error("provider returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("malformed decision output: {0}")]
    MalformedDecision(MalformedOutputWarning),
}

impl GenerationError {
    /// Whether repeating the same call may succeed.
    ///
    /// Timeouts, rate limits, transport failures, 5xx responses and empty or
    /// unreadable output are transient. Configuration errors and other 4xx
    /// responses are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            Self::Timeout(_)
            | Self::RateLimited
            | Self::InvalidResponse(_)
            | Self::EmptyResponse
            | Self::MalformedDecision(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(GenerationError::Timeout(Duration::from_secs(60)).is_retryable());
        assert!(GenerationError::RateLimited.is_retryable());
        assert!(GenerationError::EmptyResponse.is_retryable());
        assert!(
            GenerationError::Api {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!GenerationError::Config("no key".to_string()).is_retryable());
        assert!(
            !GenerationError::Api {
                status: 401,
                body: "bad key".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn timeout_message_names_seconds() {
        assert_eq!(
            GenerationError::Timeout(Duration::from_secs(60)).to_string(),
            "generation timed out after 60s"
        );
    }
}
