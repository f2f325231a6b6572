//! Error types for the OfficeClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external boundary has its own error enum.

use thiserror::Error;

/// The top-level error type for all OfficeClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Reasoning engine transport ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Business-domain API ---
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    // --- Reasoning step decoding ---
    #[error("Reasoner error: {0}")]
    Reasoner(#[from] ReasonerError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Boundary errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors surfaced by the business-domain API.
///
/// `Domain` is the typed error the platform returns for a rejected request;
/// its message drives the error classifier. `Transport` is everything else
/// (connection drops, undecodable bodies) and is treated as a generic fault.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{message}")]
    Domain { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn domain(status: u16, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
        }
    }

    /// The domain message, if this is a typed domain error.
    pub fn domain_message(&self) -> Option<&str> {
        match self {
            Self::Domain { message, .. } => Some(message),
            Self::Transport(_) => None,
        }
    }
}

/// A reasoning step could not be obtained.
///
/// Both variants count as reasoning-engine failures in the agent loop.
#[derive(Debug, Clone, Error)]
pub enum ReasonerError {
    #[error("reasoning transport failed: {0}")]
    Transport(#[from] ProviderError),

    #[error("reasoning output could not be decoded: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn domain_error_displays_raw_message() {
        let err = ApiError::domain(403, "Only lead can modify project");
        assert_eq!(err.to_string(), "Only lead can modify project");
        assert_eq!(err.domain_message(), Some("Only lead can modify project"));
    }

    #[test]
    fn transport_error_has_no_domain_message() {
        let err = ApiError::Transport("connection reset".into());
        assert!(err.domain_message().is_none());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn reasoner_error_wraps_provider_error() {
        let err: ReasonerError = ProviderError::Timeout("60s".into()).into();
        assert!(matches!(err, ReasonerError::Transport(_)));
    }
}
