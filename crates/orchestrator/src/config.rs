use std::time::Duration;

use scoring::ScoringWeights;

/// Per-call and request-level deadlines (§5). Constructed once at startup
/// from the engine configuration, never read from the environment inside
/// the orchestrator itself.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub embed: Duration,
    pub vector_query: Duration,
    pub completion: Duration,
    pub persistence: Duration,
    pub request: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            embed: Duration::from_secs(5),
            vector_query: Duration::from_secs(2),
            completion: Duration::from_secs(10),
            persistence: Duration::from_secs(2),
            request: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Final result count K (§6 `MATCH_TOP_K`, default 3).
    pub match_top_k: usize,
    /// Candidate pool size requested from the vector index (§6
    /// `VECTOR_QUERY_TOP_K`, default 15).
    pub vector_query_top_k: usize,
    /// Bounded per-request scoring fan-out (§4.7 step 6, default
    /// `min(8, candidates)`; the ceiling is configured here).
    pub max_scoring_parallelism: usize,
    pub deadlines: Deadlines,
    pub weights: ScoringWeights,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            match_top_k: 3,
            vector_query_top_k: 15,
            max_scoring_parallelism: 8,
            deadlines: Deadlines::default(),
            weights: ScoringWeights::default(),
        }
    }
}
