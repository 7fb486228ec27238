use async_trait::async_trait;
use once_cell::sync::Lazy;
use resilience::ResilienceError;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{EmbeddingConfig, ProviderKind};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build shared reqwest client")
});

/// Text-to-vector map via an external provider (§4.3). `embed_batch`
/// implementations are expected to cap in-flight concurrency at
/// `EmbeddingConfig::concurrency_cap` internally.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ResilienceError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ResilienceError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Maximum input length tolerated before the adapter truncates (provider
/// context window proxy); concrete limit is provider-specific in practice,
/// a conservative default is used here per §4.3's "implementer must
/// truncate or error" clause.
const MAX_INPUT_CHARS: usize = 8000;

pub struct HttpEmbeddingAdapter {
    config: EmbeddingConfig,
}

impl HttpEmbeddingAdapter {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    fn build_request(&self, text: &str) -> reqwest::RequestBuilder {
        let body = match self.config.provider {
            ProviderKind::OpenAi => json!({ "model": self.config.model, "input": text }),
            ProviderKind::HuggingFace => json!({ "inputs": text }),
            ProviderKind::Custom => json!({ "model": self.config.model, "text": text }),
        };
        let mut builder = HTTP_CLIENT.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    fn extract_vector(&self, value: serde_json::Value) -> Result<Vec<f32>, ResilienceError> {
        // Providers disagree on response shape; try the common variants, as
        // the teacher's `api.rs` does ("flexible response-shape parsing").
        #[derive(Deserialize)]
        struct OpenAiBody {
            data: Vec<OpenAiEmbedding>,
        }
        #[derive(Deserialize)]
        struct OpenAiEmbedding {
            embedding: Vec<f32>,
        }

        if let Ok(body) = serde_json::from_value::<OpenAiBody>(value.clone()) {
            return body
                .data
                .into_iter()
                .next()
                .map(|e| e.embedding)
                .ok_or_else(|| ResilienceError::DependencyUnavailable("empty embedding response".into()));
        }
        if let Ok(flat) = serde_json::from_value::<Vec<f32>>(value.clone()) {
            return Ok(flat);
        }
        if let Ok(nested) = serde_json::from_value::<Vec<Vec<f32>>>(value) {
            return nested
                .into_iter()
                .next()
                .ok_or_else(|| ResilienceError::DependencyUnavailable("empty embedding response".into()));
        }
        Err(ResilienceError::DependencyUnavailable("unrecognized embedding response shape".into()))
    }

    fn map_transport_error(err: reqwest::Error) -> ResilienceError {
        if err.is_timeout() {
            ResilienceError::DependencyUnavailable(format!("timed out: {err}"))
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                ResilienceError::Throttled { retry_after_ms: None }
            } else if status.is_server_error() {
                ResilienceError::DependencyUnavailable(format!("server error {status}"))
            } else {
                ResilienceError::ConfigInvalid(format!("request rejected: {status}"))
            }
        } else {
            ResilienceError::DependencyUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbeddingAdapter {
    /// Bounds in-flight requests at `EmbeddingConfig::concurrency_cap`,
    /// same `buffer_unordered` pattern the orchestrator uses for its
    /// scoring fan-out.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ResilienceError> {
        use futures::stream::{self, StreamExt};

        let cap = self.config.concurrency_cap.max(1);
        let results: Vec<(usize, Result<Vec<f32>, ResilienceError>)> = stream::iter(texts.iter().enumerate())
            .map(|(idx, text)| async move { (idx, self.embed(text).await) })
            .buffer_unordered(cap)
            .collect()
            .await;

        let mut ordered: Vec<(usize, Result<Vec<f32>, ResilienceError>)> = results;
        ordered.sort_by_key(|(idx, _)| *idx);
        ordered.into_iter().map(|(_, result)| result).collect()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ResilienceError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ResilienceError::Validation("embedding input is empty".into()));
        }
        if trimmed.chars().count() > MAX_INPUT_CHARS {
            return Err(ResilienceError::Oversized(format!(
                "input of {} chars exceeds max {MAX_INPUT_CHARS}",
                trimmed.chars().count()
            )));
        }

        let response = self.build_request(trimmed).send().await.map_err(Self::map_transport_error)?;
        let response = response.error_for_status().map_err(Self::map_transport_error)?;
        let body: serde_json::Value = response.json().await.map_err(Self::map_transport_error)?;
        let vector = self.extract_vector(body)?;
        if vector.len() != self.config.dimension {
            return Err(ResilienceError::ConfigInvalid(format!(
                "embedding dimension {} does not match configured dimension {}",
                vector.len(),
                self.config.dimension
            )));
        }
        Ok(vector)
    }
}

/// Deterministic hash-based stub for tests: same text always maps to the
/// same vector, with no network dependency. Grounded in the teacher's
/// "fast tier" stub concept (`SemanticConfig` mode `"fast"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StubEmbeddingAdapter {
    pub dimension: usize,
}

#[async_trait]
impl EmbeddingAdapter for StubEmbeddingAdapter {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ResilienceError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ResilienceError::Validation("embedding input is empty".into()));
        }
        let hash = fxhash::hash64(trimmed.as_bytes());
        let mut vector = Vec::with_capacity(self.dimension);
        let mut state = hash;
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0;
            vector.push(value as f32);
        }
        Ok(vector)
    }
}
