use std::sync::Arc;

use catalog::CatalogCache;
use dashmap::DashMap;
use orchestrator::{HealthAggregator, MatchOrchestrator};
use providers::{HttpCompletionAdapter, HttpEmbeddingAdapter};
use resilience::CircuitBreakerManager;
use vector_index::http::HttpVectorIndex;

use crate::config::EngineConfig;
use crate::error::ServerResult;

/// Shared application state, built once at startup and cloned (cheaply,
/// via `Arc`) into every request handler.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<EngineConfig>,
    pub orchestrator: Arc<MatchOrchestrator>,
    pub health: Arc<HealthAggregator>,
    pub catalog: Arc<CatalogCache>,
    rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,
}

impl ServerState {
    pub fn new(
        config: EngineConfig,
        catalog: Arc<CatalogCache>,
        persistence: Arc<dyn orchestrator::PersistencePort>,
    ) -> ServerResult<Self> {
        let vector_index = Arc::new(HttpVectorIndex::new(vector_index::http::HttpVectorIndexConfig {
            base_url: config.vector_index_url.clone(),
            index_name: config.vector_index_name.clone(),
            api_key: config.vector_index_api_key.clone(),
            dimension: config.embedding_dimension,
        }));
        let embedding = Arc::new(HttpEmbeddingAdapter::new(config.embedding_config()));
        let completion = Arc::new(HttpCompletionAdapter::new(config.completion_config()));
        let breakers = Arc::new(CircuitBreakerManager::new(config.circuit_breaker_config()));
        let health = Arc::new(HealthAggregator::new(breakers.clone()));

        let orchestrator = Arc::new(MatchOrchestrator::new(
            embedding,
            vector_index,
            completion,
            persistence,
            catalog.clone(),
            breakers,
            health.clone(),
            config.retry_config(),
            config.orchestrator_config(),
        ));

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            health,
            catalog,
            rate_limiter: Arc::new(DashMap::new()),
        })
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Whether API-key auth is enforced at all. Off by default (§6):
    /// deployments with no configured keys run unauthenticated.
    pub fn auth_enabled(&self) -> bool {
        !self.config.api_keys.is_empty()
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        const LIMIT: u32 = 600;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }
        if *count >= LIMIT {
            return false;
        }
        *count += 1;
        true
    }
}
