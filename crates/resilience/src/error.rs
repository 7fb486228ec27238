use thiserror::Error;

/// The shared error taxonomy (§7) raised by adapters and interpreted by the
/// resilience layer to decide retryable vs. terminal outcomes.
#[derive(Debug, Error, Clone)]
pub enum ResilienceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("throttled{}", retry_after_ms.map(|ms| format!(", retry after {ms}ms")).unwrap_or_default())]
    Throttled { retry_after_ms: Option<u64> },
    #[error("circuit open")]
    CircuitOpen,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("oversized input: {0}")]
    Oversized(String),
}

impl ResilienceError {
    /// Only `Throttled` and `DependencyUnavailable` are retryable; everything
    /// else is terminal for the retrier (§4.5, §7).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResilienceError::Throttled { .. } | ResilienceError::DependencyUnavailable(_))
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ResilienceError::Throttled { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }
}
