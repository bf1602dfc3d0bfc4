//! OpenAI embedder implementation over the REST embeddings endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::search::traits::{Embedder, Result, SearchError};

/// OpenAI embedding model configuration.
pub const OPENAI_MODEL: &str = "text-embedding-3-small";
pub const OPENAI_DIMENSIONS: usize = 1536;
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Embedder implementation using OpenAI's `/embeddings` endpoint.
///
/// # Example
///
/// ```ignore
/// let embedder = OpenAiEmbedder::new(api_key).with_timeout(Duration::from_secs(10))?;
/// let embedding = embedder.embed("pricing plans").await?;
/// assert_eq!(embedding.len(), 1536);
/// ```
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiEmbedder {
    /// Create a new embedder with the default model, dimensions and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: OPENAI_API_URL.to_string(),
            api_key: api_key.into(),
            model: OPENAI_MODEL.to_string(),
            dimensions: OPENAI_DIMENSIONS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Bound each embedding request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::ConfigError(e.to_string()))?;
        Ok(self)
    }

    /// Try to create from environment variable.
    ///
    /// Reads `OPENAI_API_KEY`, falling back to the older `OPEN_API_KEY` name.
    /// Returns `None` if neither is set.
    pub fn try_from_env() -> Option<Self> {
        std::env::var("OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPEN_API_KEY"))
            .ok()
            .map(Self::new)
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(SearchError::EmbeddingError("Cannot embed empty text".into()));
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::EmbeddingError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SearchError::EmbeddingError(format!("{}: {}", status, message)));
        }

        let response: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::EmbeddingError(format!("Invalid response: {}", e)))?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| SearchError::EmbeddingError("No embedding in response".into()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
