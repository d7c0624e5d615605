//! Error types for gateway requests

use std::time::Duration;

/// Errors surfaced to callers of `Gateway::request`.
///
/// `Clone` because a single refresh outcome is handed to every caller that
/// joined the refresh episode. Payloads are rendered messages for the same
/// reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Parse(String),

    /// The API answered with a non-success status. Displays as the message
    /// alone so callers can show it to the user directly.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("token refresh timed out after {}s", .0.as_secs())]
    RefreshTimeout(Duration),

    #[error("credential storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Metric label for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Transport(_) => "transport",
            Error::Parse(_) => "parse",
            Error::Api { .. } => "api",
            Error::SessionExpired => "session_expired",
            Error::RefreshTimeout(_) => "refresh_timeout",
            Error::Storage(_) => "storage",
        }
    }

    /// Message handed to the `on_error` hook.
    pub fn hook_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Fallback hook message when an error renders to nothing.
pub const GENERIC_FAILURE_MESSAGE: &str = "Network error";

impl From<tailor_auth::Error> for Error {
    fn from(err: tailor_auth::Error) -> Self {
        match err {
            tailor_auth::Error::Http(msg) => Error::Transport(msg),
            tailor_auth::Error::InvalidResponse(msg) => Error::Parse(msg),
            tailor_auth::Error::RefreshRejected { status, body } => Error::Api {
                status,
                message: body,
            },
            tailor_auth::Error::CredentialParse(msg) | tailor_auth::Error::Io(msg) => {
                Error::Storage(msg)
            }
        }
    }
}

/// Result alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
