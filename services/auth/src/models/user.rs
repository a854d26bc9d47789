//! Login and signup payloads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials submitted to the login and signup endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

// Passwords never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub token: Option<String>,
}

impl LoginResponse {
    /// The issued bearer token, whichever field the backend used
    pub fn into_token(self) -> Option<String> {
        self.access_token
            .or(self.token)
            .filter(|t| !t.trim().is_empty())
    }
}

/// Successful signup response
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}
