//! API resilience patterns: circuit breaker and bounded retry with backoff
//! and jitter. Every outbound call made by the vector index, embedding, and
//! completion adapters is wrapped here.

pub mod circuit_breaker;
pub mod error;
pub mod retry;
pub mod serde_millis;

use std::future::Future;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerManager, CircuitState};
pub use error::ResilienceError;
pub use retry::{backoff_delay, execute_with_retry, RetryConfig};

/// `breaker(retry(op))`: the canonical composition (§4.5). The breaker gates
/// admission up front and only observes the *terminal* outcome of the
/// (possibly retried) call — intermediate retry failures never touch the
/// breaker's counters.
pub async fn call_guarded<T, F, Fut>(
    breaker: &CircuitBreaker,
    retry_config: &RetryConfig,
    op: F,
) -> Result<T, ResilienceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ResilienceError>>,
{
    breaker.allow()?;
    let result = execute_with_retry(retry_config, op).await;
    match &result {
        Ok(_) => breaker.record_success(),
        Err(_) => breaker.record_failure(),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn guarded_call_opens_breaker_after_terminal_failures() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout: Duration::from_secs(30),
        });
        let retry_config = RetryConfig {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        for _ in 0..2 {
            let _: Result<(), ResilienceError> =
                call_guarded(&breaker, &retry_config, || async { Err(ResilienceError::DependencyUnavailable("down".into())) }).await;
        }

        assert_eq!(breaker.state(), CircuitState::Open);
        let calls = AtomicU32::new(0);
        let result: Result<(), ResilienceError> = call_guarded(&breaker, &retry_config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
