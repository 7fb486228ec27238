use thiserror::Error;

/// Orchestrator-level error taxonomy (§7). Adapter-level [`resilience::ResilienceError`]s
/// are resolved into graceful degradation wherever the algorithm allows; this
/// type covers the outcomes that do fail the request.
#[derive(Debug, Error)]
pub enum MatchEngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl MatchEngineError {
    pub fn code(&self) -> &'static str {
        match self {
            MatchEngineError::Validation(_) => "VALIDATION_ERROR",
            MatchEngineError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            MatchEngineError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            MatchEngineError::ConfigInvalid(_) => "CONFIG_INVALID",
        }
    }
}
