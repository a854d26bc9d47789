//! Custom error types for the common library
//!
//! This module defines the error type shared by every persistent store
//! backend.

use thiserror::Error;

/// Custom error type for persistent store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error occurred while reading or writing the local filesystem
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the Redis backend
    #[error("Store backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Key cannot be mapped onto the backend
    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
