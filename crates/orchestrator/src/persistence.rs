use async_trait::async_trait;
use once_cell::sync::Lazy;
use resilience::ResilienceError;
use scoring::Match;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build shared reqwest client")
});

/// Abstract write-back port (§9: "persistence is a port with a single
/// method"). Whether this is invoked at all is gated on the caller
/// supplying an `assignmentId` (§4.7 step 9, §9 open question).
#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn persist_matches(
        &self,
        assignment_id: &str,
        matches: &[Match],
        reasoning: Option<&str>,
    ) -> Result<(), ResilienceError>;
}

/// No-op implementation for deployments or tests with no configured
/// persistence collaborator.
pub struct NoopPersistence;

#[async_trait]
impl PersistencePort for NoopPersistence {
    async fn persist_matches(&self, _assignment_id: &str, _matches: &[Match], _reasoning: Option<&str>) -> Result<(), ResilienceError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpPersistenceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Writes match results back to the document store (§4, fourth external
/// collaborator). Best-effort from the orchestrator's point of view: its
/// caller never fails a request solely because this write failed.
pub struct HttpPersistence {
    config: HttpPersistenceConfig,
}

impl HttpPersistence {
    pub fn new(config: HttpPersistenceConfig) -> Self {
        Self { config }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistBody<'a> {
    match_results: &'a [Match],
}

#[async_trait]
impl PersistencePort for HttpPersistence {
    async fn persist_matches(&self, assignment_id: &str, matches: &[Match], _reasoning: Option<&str>) -> Result<(), ResilienceError> {
        let url = format!(
            "{}/assignments/{}/matches",
            self.config.base_url.trim_end_matches('/'),
            assignment_id
        );
        let mut builder = HTTP_CLIENT.patch(&url).json(&PersistBody { match_results: matches });
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(|err| ResilienceError::DependencyUnavailable(err.to_string()))?;
        response
            .error_for_status()
            .map_err(|err| ResilienceError::DependencyUnavailable(err.to_string()))?;
        Ok(())
    }
}
