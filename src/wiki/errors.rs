//! Error types produced by the content provider.

use thiserror::Error;

/// Failures reported by a [`ContentProvider`](super::ContentProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Searched page or language edition does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Remote call did not answer in time
    #[error("timed out: {0}")]
    Timeout(String),
    /// Circuit breaker is open, calls fail fast
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// HTTP transport failure
    #[error("request failed: {0}")]
    Request(String),
    /// The service answered with a payload that does not parse
    #[error("malformed response: {0}")]
    Decode(String),
    /// Translation service failure
    #[error("translation failed: {0}")]
    Translation(String),
    /// Document could not be produced
    #[error("document generation failed: {0}")]
    Document(String),
    /// Malformed input, e.g. an empty title
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ProviderError {
    /// Whether retrying the same call has a chance to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Request(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Request(err.to_string())
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Document(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = ProviderError::Timeout("search".to_string());
        assert_eq!(err.to_string(), "timed out: search");
        assert!(err.is_transient());
        assert!(!ProviderError::NotFound("x".to_string()).is_transient());
        assert!(!ProviderError::Decode("expected value".to_string()).is_transient());
    }
}
