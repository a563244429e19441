//! Wizard backend HTTP client (http://localhost:8000 by default).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::protocol::{
    ChatRequest, ChatResponse, CreateSessionRequest, CreateSessionResponse, HealthResponse,
    ScopeDetailsExport,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("wizard request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("wizard api error: {0}")]
    Api(String),
    #[error("wizard response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The three operations a conversation needs from the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a new run, optionally seeded with free text.
    async fn create_session(
        &self,
        raw_text: Option<String>,
    ) -> Result<CreateSessionResponse, ApiError>;

    /// Send one user turn; the response carries the full transcript.
    async fn send_message(&self, run_id: &str, message: &str) -> Result<ChatResponse, ApiError>;

    /// Current transcript, step and snapshot of an existing run.
    async fn get_chat_history(&self, run_id: &str) -> Result<ChatResponse, ApiError>;
}

/// Client for the wizard HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: reqwest::Client::new(),
        }
    }

    /// Client with an optional per-request timeout. A timed-out request fails like any other
    /// transport error.
    pub fn with_timeout(
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client: builder.build()?,
        })
    }

    /// Client configured from the loaded config (base URL with env override, timeout).
    pub fn from_config(config: &crate::config::Config) -> Result<Self, ApiError> {
        Self::with_timeout(
            Some(crate::config::resolve_api_base_url(config)),
            crate::config::request_timeout(config),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /export/{run_id}/scope-details — per-scope detail collected for a run.
    pub async fn export_scope_details(&self, run_id: &str) -> Result<ScopeDetailsExport, ApiError> {
        let url = format!("{}/export/{}/scope-details", self.base_url, run_id);
        let res = self.client.get(&url).send().await?;
        decode(res).await
    }

    /// GET /health
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let url = format!("{}/health", self.base_url);
        let res = self.client.get(&url).send().await?;
        decode(res).await
    }
}

#[async_trait]
impl Transport for ApiClient {
    /// POST /sessions/
    async fn create_session(
        &self,
        raw_text: Option<String>,
    ) -> Result<CreateSessionResponse, ApiError> {
        let url = format!("{}/sessions/", self.base_url);
        let body = CreateSessionRequest { raw_text };
        log::debug!("POST {}", url);
        let res = self.client.post(&url).json(&body).send().await?;
        decode(res).await
    }

    /// POST /chat/{run_id}/message
    async fn send_message(&self, run_id: &str, message: &str) -> Result<ChatResponse, ApiError> {
        let url = format!("{}/chat/{}/message", self.base_url, run_id);
        let body = ChatRequest {
            message: message.to_string(),
        };
        log::debug!("POST {} ({} chars)", url, message.chars().count());
        let res = self.client.post(&url).json(&body).send().await?;
        decode(res).await
    }

    /// GET /chat/{run_id}/history
    async fn get_chat_history(&self, run_id: &str) -> Result<ChatResponse, ApiError> {
        let url = format!("{}/chat/{}/history", self.base_url, run_id);
        log::debug!("GET {}", url);
        let res = self.client.get(&url).send().await?;
        decode(res).await
    }
}

fn normalize_base_url(base_url: Option<String>) -> String {
    base_url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ApiError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(ApiError::Api(format!("{} {}", status, body)));
    }
    let text = res.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_and_trims() {
        assert_eq!(ApiClient::new(None).base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            ApiClient::new(Some("http://wizard:9000/".into())).base_url(),
            "http://wizard:9000"
        );
        assert_eq!(ApiClient::new(Some("  ".into())).base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn timeout_client_builds() {
        let c = ApiClient::with_timeout(None, Some(Duration::from_secs(30))).unwrap();
        assert_eq!(c.base_url(), DEFAULT_BASE_URL);
    }
}
