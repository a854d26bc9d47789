//! Error types for the chat service

use common::StoreError;
use thiserror::Error;

use crate::models::SessionId;

/// Errors from session collection operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// No session with this id exists
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// A rename was requested with a blank title
    #[error("Session title must not be empty")]
    EmptyTitle,

    /// The collection could not be serialized
    #[error("Failed to encode sessions: {0}")]
    Encode(#[from] serde_json::Error),

    /// The snapshot could not be written; in-memory state is unchanged
    #[error("Failed to persist sessions: {0}")]
    Store(#[from] StoreError),
}

/// Type alias for session results
pub type SessionResult<T> = Result<T, SessionError>;

/// Classified failure of one exchange with the backend responder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The backend could not be reached
    #[error("Could not reach the server: {0}")]
    Transport(String),

    /// The backend refused the credential (HTTP 401 or 403)
    #[error("Your session expired. Please log in again.")]
    Unauthorized,

    /// The backend answered with a non-success status
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The backend answered 2xx with a body we could not read
    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ResponderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ResponderError::MalformedResponse(e.to_string())
        } else {
            ResponderError::Transport(e.to_string())
        }
    }
}

/// Errors from speech capture
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Failed to start speech recognizer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Speech recognizer exited with {0}")]
    Recognizer(std::process::ExitStatus),

    #[error("No speech was recognized")]
    NoSpeech,
}
