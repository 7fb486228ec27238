use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ResilienceError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Delay before attempt `n` (1-indexed): `baseDelay * 2^(n-1)`, jittered by
/// ±20%, capped at `max_delay`. If `retry_after_hint` is present, the
/// honored delay is `max(hint, computed)` (§4.5, property 8).
pub fn backoff_delay(config: &RetryConfig, attempt: u32, retry_after_hint: Option<Duration>) -> Duration {
    let exp = config.base_delay.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
    let capped = exp.min(config.max_delay.as_secs_f64());
    let jitter_fraction = 1.0 + (fastrand::f64() * 0.4 - 0.2); // ±20%
    let jittered = (capped * jitter_fraction).max(0.0);
    let computed = Duration::from_secs_f64(jittered.min(config.max_delay.as_secs_f64()));
    match retry_after_hint {
        Some(hint) if hint > computed => hint,
        _ => computed,
    }
}

/// Execute `op` with bounded retry. Only errors classified as retryable by
/// [`ResilienceError::is_retryable`] are retried; anything else propagates
/// immediately. The breaker is *not* touched here — composition with a
/// breaker (`breaker(retry(op))`) is the caller's responsibility so that
/// only the final, terminal outcome is recorded against it (§4.5).
pub async fn execute_with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, ResilienceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ResilienceError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_attempts => {
                let delay = backoff_delay(config, attempt, err.retry_after_ms().map(Duration::from_millis));
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
