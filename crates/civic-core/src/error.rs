//! Error types for civic-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The issue service answered with a non-success status.
    #[error("Service error: {}", .message.as_deref().unwrap_or("no message"))]
    Service {
        status: Option<u16>,
        message: Option<String>,
    },

    /// The session is missing or expired. Handled by the session guard, not here.
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("authentication required"))]
    Unauthorized { message: Option<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Human-readable message supplied by the service, if it sent one.
    ///
    /// Transport and decode faults carry no service message; callers fall
    /// back to their own wording for those.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Error::Service { message, .. } | Error::Unauthorized { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
