//! Text embedding capability

use crate::auth;
use crate::client::{check_status, transport_error};
use crate::retry::{retry_transient, RetryPolicy};
use crate::types::{EmbeddingRequest, EmbeddingResponse};
use async_trait::async_trait;
use quill_core::config::QuillConfig;
use quill_core::{InvocationFailure, QuillError, Result};
use std::time::Duration;
use tracing::{debug, instrument};

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Turns text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this embedder returns
    fn dimensions(&self) -> usize;
}

/// OpenAI embeddings endpoint
///
/// Construction never fails. The credential is resolved on the first call.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    model: String,
    dimensions: usize,
    api_key_env: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &QuillConfig) -> Self {
        Self::new(config.embedding.model.clone(), config.embedding.dimensions)
            .with_api_key_env(config.embedding.api_key_env.clone())
            .with_retry(RetryPolicy::from_config(&config.retry))
    }

    pub fn with_api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = env_var.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn attempt(&self, api_key: &str, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let send = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send();

        let response = send.await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            QuillError::invocation(
                InvocationFailure::MalformedResponse,
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| QuillError::Embedding("Empty embedding response".to_string()))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = auth::resolve_api_key(&self.api_key_env)?;

        let vector = retry_transient("embedding", &self.retry, |_| self.attempt(&api_key, text)).await?;
        check_dimensions(&vector, self.dimensions)?;

        debug!("Embedded {} chars into {} dimensions", text.len(), vector.len());
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Reject vectors whose length differs from the expected dimensionality
pub fn check_dimensions(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(QuillError::Embedding(format!(
            "expected {} dimensions, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}
