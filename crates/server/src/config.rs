use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use providers::config::{CompletionConfig, EmbeddingConfig, ProviderKind};
use resilience::{CircuitBreakerConfig, RetryConfig};
use serde::{Deserialize, Serialize};

/// Full composition-root configuration: HTTP server settings plus every
/// named environment variable from the engine's configuration surface
/// (§6). Loaded once at startup via [`EngineConfig::load`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_keys: HashSet<String>,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_vector_index_name")]
    pub vector_index_name: String,
    #[serde(default = "default_vector_index_url")]
    pub vector_index_url: String,
    #[serde(default)]
    pub vector_index_api_key: Option<String>,

    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default)]
    pub embedding_api_key: Option<String>,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default = "default_completion_url")]
    pub completion_url: String,
    #[serde(default)]
    pub completion_api_key: Option<String>,

    #[serde(default = "default_match_top_k")]
    pub match_top_k: usize,
    #[serde(default = "default_vector_query_top_k")]
    pub vector_query_top_k: usize,
    #[serde(default = "default_max_scoring_parallelism")]
    pub max_scoring_parallelism: usize,

    #[serde(default = "default_catalog_refresh_ttl_ms")]
    pub catalog_refresh_ttl_ms: u64,
    #[serde(default = "default_catalog_source_url")]
    pub catalog_source_url: String,
    #[serde(default)]
    pub catalog_source_api_key: Option<String>,

    #[serde(default = "default_breaker_failure_threshold")]
    pub breaker_failure_threshold: u32,
    #[serde(default = "default_breaker_reset_ms")]
    pub breaker_reset_ms: u64,

    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            vector_index_name: default_vector_index_name(),
            vector_index_url: default_vector_index_url(),
            vector_index_api_key: None,
            ai_provider: default_ai_provider(),
            embedding_model: default_embedding_model(),
            embedding_url: default_embedding_url(),
            embedding_api_key: None,
            embedding_dimension: default_embedding_dimension(),
            completion_model: default_completion_model(),
            completion_url: default_completion_url(),
            completion_api_key: None,
            match_top_k: default_match_top_k(),
            vector_query_top_k: default_vector_query_top_k(),
            max_scoring_parallelism: default_max_scoring_parallelism(),
            catalog_refresh_ttl_ms: default_catalog_refresh_ttl_ms(),
            catalog_source_url: default_catalog_source_url(),
            catalog_source_api_key: None,
            breaker_failure_threshold: default_breaker_failure_threshold(),
            breaker_reset_ms: default_breaker_reset_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            request_deadline_ms: default_request_deadline_ms(),
        }
    }
}

impl EngineConfig {
    /// Load from an optional `engine.toml`/`engine.json` file, then
    /// environment variables (no prefix — the names in §6 are used
    /// verbatim, e.g. `MATCH_TOP_K`).
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("engine").required(false))
            .add_source(config::Environment::default());

        let mut cfg: EngineConfig = builder.build()?.try_deserialize()?;
        if cfg.api_keys.is_empty() {
            tracing::warn!("no API keys configured; the x-api-key auth layer is disabled");
        }
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_addr, self.port).parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::from_str(&self.ai_provider)
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            api_url: self.embedding_url.clone(),
            api_key: self.embedding_api_key.clone(),
            provider: self.provider_kind(),
            model: self.embedding_model.clone(),
            dimension: self.embedding_dimension,
            concurrency_cap: 3,
        }
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            api_url: self.completion_url.clone(),
            api_key: self.completion_api_key.clone(),
            provider: self.provider_kind(),
            model: self.completion_model.clone(),
        }
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker_failure_threshold,
            reset_timeout: Duration::from_millis(self.breaker_reset_ms),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn catalog_refresh_ttl(&self) -> Duration {
        Duration::from_millis(self.catalog_refresh_ttl_ms)
    }

    pub fn catalog_source_config(&self) -> catalog::http::HttpCatalogConfig {
        catalog::http::HttpCatalogConfig {
            base_url: self.catalog_source_url.clone(),
            api_key: self.catalog_source_api_key.clone(),
        }
    }

    pub fn persistence_config(&self) -> orchestrator::HttpPersistenceConfig {
        orchestrator::HttpPersistenceConfig {
            base_url: self.catalog_source_url.clone(),
            api_key: self.catalog_source_api_key.clone(),
        }
    }

    pub fn orchestrator_config(&self) -> orchestrator::OrchestratorConfig {
        orchestrator::OrchestratorConfig {
            match_top_k: self.match_top_k,
            vector_query_top_k: self.vector_query_top_k,
            max_scoring_parallelism: self.max_scoring_parallelism,
            deadlines: orchestrator::Deadlines {
                request: Duration::from_millis(self.request_deadline_ms),
                ..orchestrator::Deadlines::default()
            },
            weights: scoring::ScoringWeights::default(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_vector_index_name() -> String {
    "creator-match-engine".to_string()
}
fn default_vector_index_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_ai_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_url() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}
fn default_embedding_dimension() -> usize {
    384
}
fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_completion_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_match_top_k() -> usize {
    3
}
fn default_vector_query_top_k() -> usize {
    15
}
fn default_max_scoring_parallelism() -> usize {
    8
}
fn default_catalog_refresh_ttl_ms() -> u64 {
    300_000
}
fn default_catalog_source_url() -> String {
    "http://localhost:8090".to_string()
}
fn default_breaker_failure_threshold() -> u32 {
    5
}
fn default_breaker_reset_ms() -> u64 {
    30_000
}
fn default_retry_max_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    100
}
fn default_retry_max_delay_ms() -> u64 {
    5_000
}
fn default_request_deadline_ms() -> u64 {
    15_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.match_top_k, 3);
        assert_eq!(cfg.vector_query_top_k, 15);
        assert_eq!(cfg.breaker_failure_threshold, 5);
        assert_eq!(cfg.breaker_reset_ms, 30_000);
        assert_eq!(cfg.retry_max_attempts, 3);
    }

    #[test]
    fn socket_addr_parses() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.socket_addr().unwrap().port(), 8080);
    }
}
