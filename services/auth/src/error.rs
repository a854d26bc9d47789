//! Custom error types for the authentication service

use common::StoreError;
use thiserror::Error;

/// Custom error type for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// An empty credential was offered to the gate
    #[error("Credential must not be empty")]
    EmptyToken,

    /// Login succeeded but the body carried no token
    #[error("No token returned from server")]
    MissingToken,

    /// Form input failed validation before any request was sent
    #[error("{0}")]
    Invalid(String),

    /// The backend refused the request; the message is shown as-is
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or answered garbage
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credential could not be written through to storage
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
