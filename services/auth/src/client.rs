//! HTTP client for the backend's login and signup endpoints

use common::response::error_message;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use tracing::{info, warn};

use crate::error::{AuthError, AuthResult};
use crate::models::{Credentials, LoginResponse, RegisterResponse};
use crate::validation;

/// Client for `POST /api/login` and `POST /api/register`
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client reusing an existing connection pool
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<String> {
        validation::validate_login(credentials).map_err(AuthError::Invalid)?;
        info!("Login attempt for user: {}", credentials.email);

        let response = self
            .http
            .post(format!("{}/api/login", self.base_url))
            .json(credentials)
            .send()
            .await?;

        let response = reject_unsuccessful(response).await?;
        let body: LoginResponse = response.json().await?;
        body.into_token().ok_or(AuthError::MissingToken)
    }

    /// Create a student account
    pub async fn register(&self, credentials: &Credentials) -> AuthResult<RegisterResponse> {
        validation::validate_signup(credentials).map_err(AuthError::Invalid)?;
        info!("Signup attempt for user: {}", credentials.email);

        let response = self
            .http
            .post(format!("{}/api/register", self.base_url))
            .json(credentials)
            .send()
            .await?;

        let response = reject_unsuccessful(response).await?;
        Ok(response.json().await?)
    }
}

async fn reject_unsuccessful(response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status.as_u16(), content_type.as_deref(), &body);

    warn!("Backend rejected auth request with {}: {}", status, message);
    Err(AuthError::Rejected(message))
}
