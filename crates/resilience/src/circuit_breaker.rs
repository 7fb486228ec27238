use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::ResilienceError;

/// Circuit breaker state machine (§4.5). `Closed` admits calls normally;
/// `Open` fails fast until `reset_timeout` elapses; `HalfOpen` admits a
/// single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    #[serde(with = "crate::serde_millis")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// A single dependency's breaker. State transitions are guarded by a mutex
/// over the coarse state enum plus the half-open probe admission flag;
/// failure/success counters are plain atomics since only their monotonic
/// accumulation (not cross-field consistency) matters to the transition
/// logic, which re-reads under the same lock that flips state.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<CircuitState>,
    consecutive_failures: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    half_open_probe_in_flight: Mutex<bool>,
    trips: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CircuitState::Closed),
            consecutive_failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            half_open_probe_in_flight: Mutex::new(false),
            trips: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.maybe_transition_to_half_open();
        *self.state.lock().unwrap()
    }

    pub fn trip_count(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }

    fn maybe_transition_to_half_open(&self) {
        let mut state = self.state.lock().unwrap();
        if *state != CircuitState::Open {
            return;
        }
        let opened_at = *self.opened_at.lock().unwrap();
        if let Some(opened_at) = opened_at {
            if opened_at.elapsed() >= self.config.reset_timeout {
                *state = CircuitState::HalfOpen;
            }
        }
    }

    /// Admission check. Returns `Err(CircuitOpen)` if the call must not
    /// proceed, `Ok(())` otherwise. In `HalfOpen`, only one caller is
    /// admitted as the probe; concurrent callers see `CircuitOpen`.
    pub fn allow(&self) -> Result<(), ResilienceError> {
        self.maybe_transition_to_half_open();
        let state = *self.state.lock().unwrap();
        match state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => Err(ResilienceError::CircuitOpen),
            CircuitState::HalfOpen => {
                let mut in_flight = self.half_open_probe_in_flight.lock().unwrap();
                if *in_flight {
                    Err(ResilienceError::CircuitOpen)
                } else {
                    *in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Record a terminal success: closes the breaker and zeroes the failure
    /// counter.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        *self.half_open_probe_in_flight.lock().unwrap() = false;
        *self.state.lock().unwrap() = CircuitState::Closed;
    }

    /// Record a terminal failure: in `HalfOpen`, reopens immediately and
    /// restarts the timer; in `Closed`, trips to `Open` once
    /// `failure_threshold` consecutive failures accumulate.
    pub fn record_failure(&self) {
        *self.half_open_probe_in_flight.lock().unwrap() = false;
        let mut state = self.state.lock().unwrap();
        match *state {
            CircuitState::HalfOpen => {
                *state = CircuitState::Open;
                *self.opened_at.lock().unwrap() = Some(Instant::now());
                self.trips.fetch_add(1, Ordering::Relaxed);
            }
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    *state = CircuitState::Open;
                    *self.opened_at.lock().unwrap() = Some(Instant::now());
                    self.trips.fetch_add(1, Ordering::Relaxed);
                }
            }
            CircuitState::Open => {
                // Already open; refresh the timer so a failing probe (should
                // one slip through a race) doesn't shorten the cool-down.
                *self.opened_at.lock().unwrap() = Some(Instant::now());
            }
        }
    }
}

/// Registry of per-dependency breakers, keyed by dependency name
/// (`"vector-index"`, `"embedding"`, `"completion"`).
pub struct CircuitBreakerManager {
    breakers: DashMap<String, std::sync::Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config,
        }
    }

    pub fn get_or_create(&self, dependency: &str) -> std::sync::Arc<CircuitBreaker> {
        self.breakers
            .entry(dependency.to_string())
            .or_insert_with(|| std::sync::Arc::new(CircuitBreaker::new(self.default_config)))
            .clone()
    }

    /// Snapshot of every registered breaker's state, for the health
    /// aggregator.
    pub fn snapshot(&self) -> Vec<(String, CircuitState)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state()))
            .collect()
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_failure_threshold() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(30),
        });
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.allow().is_err());
    }

    #[test]
    fn success_resets_failure_counter() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(30),
        });
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_reset_timeout_then_closes_on_success() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_millis(10),
        });
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.allow().is_ok());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_probe_failure_reopens() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_millis(10),
        });
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.allow().unwrap();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn manager_isolates_per_dependency() {
        let manager = CircuitBreakerManager::default();
        let vector = manager.get_or_create("vector-index");
        let embedding = manager.get_or_create("embedding");
        for _ in 0..5 {
            vector.record_failure();
        }
        assert_eq!(vector.state(), CircuitState::Open);
        assert_eq!(embedding.state(), CircuitState::Closed);
    }
}
