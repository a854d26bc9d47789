//! Backend responder
//!
//! The backend answers one query at a time. [`Responder`] is the seam the
//! engine talks through; [`HttpResponder`] is the real backend.

use std::future::Future;

use common::response::error_message;
use reqwest::{Client, Response, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ResponderError;

/// Something that answers a user query
pub trait Responder: Send + Sync {
    /// Send `query`, authenticated with `bearer` when one is held
    fn respond(
        &self,
        query: &str,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<String, ResponderError>> + Send;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(alias = "reply")]
    response: String,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<(String, String)>,
}

/// Responder backed by the department chat API
#[derive(Clone)]
pub struct HttpResponder {
    http: Client,
    base_url: String,
}

impl HttpResponder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Question/answer pairs the backend remembers for this client
    pub async fn history(&self) -> Result<Vec<(String, String)>, ResponderError> {
        let response = self
            .http
            .get(format!("{}/chat-history", self.base_url))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: HistoryResponse = response.json().await?;
        Ok(body.history)
    }

    /// Ask the backend to forget its conversation memory
    pub async fn reset_history(&self) -> Result<(), ResponderError> {
        let response = self
            .http
            .post(format!("{}/reset-history", self.base_url))
            .send()
            .await?;
        check_status(response).await?;
        debug!("Server history reset");
        Ok(())
    }
}

impl Responder for HttpResponder {
    async fn respond(&self, query: &str, bearer: Option<&str>) -> Result<String, ResponderError> {
        let mut request = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&ChatRequest { query });
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = check_status(request.send().await?).await?;
        let body: ChatResponse = response.json().await?;
        Ok(body.response)
    }
}

async fn check_status(response: Response) -> Result<Response, ResponderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!("Backend rejected the credential with {}", status);
        return Err(ResponderError::Unauthorized);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status.as_u16(), content_type.as_deref(), &body);

    warn!("Backend answered {}: {}", status, message);
    Err(ResponderError::Backend {
        status: status.as_u16(),
        message,
    })
}
