//! Vector index adapter (§4.2): abstracts an external approximate-nearest-
//! neighbor store over fixed-dimension vectors with cosine metric.
//!
//! [`VectorIndex`] is the capability contract; [`memory::InMemoryVectorIndex`]
//! is a linear-scan reference implementation used in tests and as a
//! self-hosted fallback, and [`http::HttpVectorIndex`] is the
//! provider-agnostic production adapter, both wrapped by the resilience
//! layer at the call site in the orchestrator.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use resilience::ResilienceError;
use serde::{Deserialize, Serialize};

pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 100;
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredId {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexStats {
    pub vector_count: u64,
    pub dimension: usize,
}

/// Clamp a caller-requested `topK` into the `[1, 100]` contract bound.
pub fn clamp_top_k(requested: usize) -> usize {
    requested.clamp(MIN_TOP_K, MAX_TOP_K)
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if absent. Must be at-most-once under races: an
    /// "already exists" response from the backend is treated as success.
    async fn ensure_index(&self, name: &str, dimension: usize) -> Result<(), ResilienceError>;

    /// Batched, idempotent-on-id upsert. Batch size must be `<= 100`.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), ResilienceError>;

    /// Idempotent, side-effect-free cosine query, sorted descending by
    /// score. `top_k` is clamped into `[1, 100]` before the call is made.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredId>, ResilienceError>;

    async fn stats(&self) -> Result<IndexStats, ResilienceError>;
}
