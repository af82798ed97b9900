//! Error types for the streamlens domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; everything converges
//! into the top-level `Error` exactly once, at the request boundary.

use thiserror::Error;

/// The top-level error type for a streamlens request.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller sent an unusable request (empty question/channel, bad body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Live-status authority ---
    #[error("Session resolution failed: {0}")]
    Session(#[from] SessionError),

    // --- Chat log store ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Answer providers ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the live-status authority (token grant + stream lookup).
///
/// Any of these is a hard failure for the whole request; only an explicit
/// "no active broadcast" result maps to an offline `SessionWindow`, and that
/// is not an error at all.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("App token acquisition failed: {0}")]
    TokenAcquisition(String),

    #[error("Live-status query failed: {message} (status: {status_code})")]
    LiveStatus { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the chat log store scan primitive.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Scan request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Malformed record in scan response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from an answer-generation lane.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Empty completion from model {0}")]
    EmptyCompletion(String),

    #[error("No answer provider configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_displays_status() {
        let err = Error::Session(SessionError::LiveStatus {
            status_code: 403,
            message: "invalid client".into(),
        });
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("invalid client"));
    }

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::NotConfigured(
            "set GEMINI_API_KEY or OPENAI_API_KEY".into(),
        ));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn store_error_converts_to_top_level() {
        let err: Error = StoreError::Network("connection refused".into()).into();
        assert!(matches!(err, Error::Store(_)));
    }
}
