//! Error types for backend calls.

use thiserror::Error;

/// Failure of a backend request before a usable response body was read.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the body's `error` field when present.
    #[error("server responded with {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Message to show the seller.
    ///
    /// Prefers the server-provided `error`, then the transport message, then
    /// `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            BackendError::Transport(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
