use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use resilience::ResilienceError;

use crate::{clamp_top_k, IndexStats, ScoredId, VectorIndex, VectorRecord, MAX_BATCH_SIZE};

/// Chunked cosine similarity, mirroring the auto-vectorization-friendly
/// dot-product/norm accumulation pattern used for the teacher's on-disk
/// index scan.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

struct Entry {
    vector: Vec<f32>,
    metadata: Option<serde_json::Value>,
}

/// Linear-scan reference implementation: exact cosine ranking, deterministic
/// ascending-id tie-break, used directly in tests and as the backing store
/// for a self-hosted deployment with no external ANN provider configured.
pub struct InMemoryVectorIndex {
    dimension: RwLock<Option<usize>>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            dimension: RwLock::new(None),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_index(&self, _name: &str, dimension: usize) -> Result<(), ResilienceError> {
        let mut dim = self.dimension.write().unwrap();
        match *dim {
            Some(existing) if existing != dimension => {
                return Err(ResilienceError::ConfigInvalid(format!(
                    "index dimension mismatch: existing {existing}, requested {dimension}"
                )));
            }
            Some(_) => {} // already exists, idempotent no-op
            None => *dim = Some(dimension),
        }
        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), ResilienceError> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(ResilienceError::ConfigInvalid(format!(
                "batch size {} exceeds max {MAX_BATCH_SIZE}",
                records.len()
            )));
        }
        let expected_dim = *self.dimension.read().unwrap();
        let mut entries = self.entries.write().unwrap();
        for record in records {
            if let Some(expected) = expected_dim {
                if record.vector.len() != expected {
                    return Err(ResilienceError::ConfigInvalid(format!(
                        "vector dimension {} does not match index dimension {expected}",
                        record.vector.len()
                    )));
                }
            }
            entries.insert(
                record.id,
                Entry {
                    vector: record.vector,
                    metadata: record.metadata,
                },
            );
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredId>, ResilienceError> {
        let top_k = clamp_top_k(top_k);
        let entries = self.entries.read().unwrap();
        let mut scored: Vec<ScoredId> = entries
            .iter()
            .map(|(id, entry)| ScoredId {
                id: id.clone(),
                score: cosine_similarity(vector, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();
        scored.sort_by(|a, b| match b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal) {
            std::cmp::Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn stats(&self) -> Result<IndexStats, ResilienceError> {
        let entries = self.entries.read().unwrap();
        Ok(IndexStats {
            vector_count: entries.len() as u64,
            dimension: self.dimension.read().unwrap().unwrap_or(0),
        })
    }
}
