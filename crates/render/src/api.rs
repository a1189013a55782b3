//! REST client for the render backend.
//!
//! Wraps job creation (`POST /render/create`) and status polling
//! (`GET /render/{id}/status`) using [`reqwest`]. The coordinator talks to
//! the backend only through the [`RenderApi`] trait.

use async_trait::async_trait;
use reelforge_core::job::JobStatus;
use reelforge_core::request::RenderRequest;
use reelforge_core::types::JobId;
use serde::{Deserialize, Serialize};

/// Body of the 202 answer to a render creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub id: JobId,
    pub status: JobStatus,
}

/// Body of a status poll. Extra fields the backend sends are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Errors from the render REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Render API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl RenderApiError {
    /// Short text suitable for a user-facing failure reason. JSON error
    /// bodies (`{"error": ...}`) are reduced to their message.
    pub fn detail(&self) -> String {
        match self {
            Self::Request(e) => e.to_string(),
            Self::ApiError { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.clone()),
        }
    }
}

#[async_trait]
pub trait RenderApi: Send + Sync {
    async fn create(&self, request: &RenderRequest) -> Result<CreatedJob, RenderApiError>;

    async fn status(&self, id: JobId) -> Result<JobStatusReport, RenderApiError>;
}

/// HTTP client for a render backend.
pub struct HttpRenderApi {
    client: reqwest::Client,
    api_url: String,
}

impl HttpRenderApi {
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`RenderApiError::ApiError`] carrying status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RenderApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RenderApi for HttpRenderApi {
    async fn create(&self, request: &RenderRequest) -> Result<CreatedJob, RenderApiError> {
        let response = self
            .client
            .post(format!("{}/render/create", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn status(&self, id: JobId) -> Result<JobStatusReport, RenderApiError> {
        let response = self
            .client
            .get(format!("{}/render/{id}/status", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
