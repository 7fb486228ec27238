use async_trait::async_trait;
use once_cell_compat::HTTP_CLIENT;
use resilience::ResilienceError;
use serde::{Deserialize, Serialize};

use crate::{clamp_top_k, IndexStats, ScoredId, VectorIndex, VectorRecord, MAX_BATCH_SIZE};

/// Configuration for the HTTP-backed provider adapter. The concrete
/// provider is swappable (§6); `base_url` and `api_key` are opaque strings
/// read once at startup into the engine configuration, never re-read from
/// the environment inside this adapter.
#[derive(Debug, Clone)]
pub struct HttpVectorIndexConfig {
    pub base_url: String,
    pub index_name: String,
    pub api_key: Option<String>,
    pub dimension: usize,
}

pub struct HttpVectorIndex {
    config: HttpVectorIndexConfig,
}

impl HttpVectorIndex {
    pub fn new(config: HttpVectorIndexConfig) -> Self {
        Self { config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'));
        let mut builder = HTTP_CLIENT.request(method, url);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
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

#[derive(Serialize)]
struct EnsureIndexBody<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'static str,
}

#[derive(Serialize)]
struct UpsertBody {
    vectors: Vec<VectorRecord>,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponseBody {
    matches: Vec<ScoredId>,
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn ensure_index(&self, name: &str, dimension: usize) -> Result<(), ResilienceError> {
        if dimension != self.config.dimension {
            return Err(ResilienceError::ConfigInvalid(format!(
                "requested dimension {dimension} does not match configured dimension {}",
                self.config.dimension
            )));
        }
        let response = self
            .request(reqwest::Method::POST, "indexes")
            .json(&EnsureIndexBody { name, dimension, metric: "cosine" })
            .send()
            .await
            .map_err(Self::map_transport_error)?;
        // Provider "already exists" responses are treated as success per the
        // at-most-once contract.
        if response.status().is_success() || response.status().as_u16() == 409 {
            Ok(())
        } else {
            Err(Self::map_transport_error(response.error_for_status().unwrap_err()))
        }
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), ResilienceError> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(ResilienceError::ConfigInvalid(format!(
                "batch size {} exceeds max {MAX_BATCH_SIZE}",
                records.len()
            )));
        }
        self.request(reqwest::Method::POST, &format!("indexes/{}/upsert", self.config.index_name))
            .json(&UpsertBody { vectors: records })
            .send()
            .await
            .map_err(Self::map_transport_error)?
            .error_for_status()
            .map_err(Self::map_transport_error)?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredId>, ResilienceError> {
        if vector.len() != self.config.dimension {
            return Err(ResilienceError::ConfigInvalid(format!(
                "query vector dimension {} does not match configured dimension {}",
                vector.len(),
                self.config.dimension
            )));
        }
        let top_k = clamp_top_k(top_k);
        let body: QueryResponseBody = self
            .request(reqwest::Method::POST, &format!("indexes/{}/query", self.config.index_name))
            .json(&QueryBody { vector, top_k })
            .send()
            .await
            .map_err(Self::map_transport_error)?
            .error_for_status()
            .map_err(Self::map_transport_error)?
            .json()
            .await
            .map_err(Self::map_transport_error)?;
        let mut matches = body.matches;
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(matches)
    }

    async fn stats(&self) -> Result<IndexStats, ResilienceError> {
        self.request(reqwest::Method::GET, &format!("indexes/{}/stats", self.config.index_name))
            .send()
            .await
            .map_err(Self::map_transport_error)?
            .error_for_status()
            .map_err(Self::map_transport_error)?
            .json()
            .await
            .map_err(Self::map_transport_error)
    }
}

/// Process-wide, connection-pooled HTTP client, mirroring the teacher's
/// `HTTP_CLIENT` global in `crates/semantic/src/api.rs`.
mod once_cell_compat {
    use once_cell::sync::Lazy;

    pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .expect("failed to build shared reqwest client")
    });
}
