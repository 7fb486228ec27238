use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;
use resilience::{CircuitBreakerManager, CircuitState};
use serde::Serialize;

const WINDOW_SIZE: usize = 50;

/// Dependencies whose breaker opening means the overall status is
/// `critical`; all other registered dependencies are non-critical and only
/// drive `degraded` (§4.8).
const CRITICAL_DEPENDENCIES: &[&str] = &["vector-index", "embedding"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyHealth {
    pub name: String,
    pub state: CircuitState,
    pub last_error: Option<String>,
    pub uptime_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub dependencies: Vec<DependencyHealth>,
}

#[derive(Default)]
struct Outcomes {
    window: VecDeque<bool>,
    last_error: Option<String>,
}

/// Folds per-dependency breaker state into an overall rollup and tracks a
/// sliding window of call outcomes for uptime reporting. Polls the shared
/// [`CircuitBreakerManager`] rather than being pushed updates, since every
/// dependency already registers itself there at first use.
pub struct HealthAggregator {
    breakers: Arc<CircuitBreakerManager>,
    outcomes: DashMap<String, Mutex<Outcomes>>,
    fallback_recently_exercised: std::sync::atomic::AtomicBool,
}

impl HealthAggregator {
    pub fn new(breakers: Arc<CircuitBreakerManager>) -> Self {
        Self {
            breakers,
            outcomes: DashMap::new(),
            fallback_recently_exercised: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn record_outcome(&self, dependency: &str, success: bool, error: Option<String>) {
        let mut entry = self
            .outcomes
            .entry(dependency.to_string())
            .or_insert_with(|| Mutex::new(Outcomes::default()));
        let mut outcomes = entry.lock().unwrap();
        outcomes.window.push_back(success);
        if outcomes.window.len() > WINDOW_SIZE {
            outcomes.window.pop_front();
        }
        if !success {
            outcomes.last_error = error;
        }
    }

    pub fn record_fallback_exercised(&self) {
        self.fallback_recently_exercised.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn report(&self) -> HealthReport {
        let breaker_states = self.breakers.snapshot();
        let mut dependencies = Vec::with_capacity(breaker_states.len());
        let mut any_critical_open = false;
        let mut any_noncritical_open = false;

        for (name, state) in &breaker_states {
            if *state == CircuitState::Open {
                if CRITICAL_DEPENDENCIES.contains(&name.as_str()) {
                    any_critical_open = true;
                } else {
                    any_noncritical_open = true;
                }
            }
            let uptime_pct = self
                .outcomes
                .get(name)
                .map(|entry| {
                    let outcomes = entry.lock().unwrap();
                    if outcomes.window.is_empty() {
                        100.0
                    } else {
                        let successes = outcomes.window.iter().filter(|s| **s).count();
                        successes as f64 / outcomes.window.len() as f64 * 100.0
                    }
                })
                .unwrap_or(100.0);
            let last_error = self.outcomes.get(name).and_then(|entry| entry.lock().unwrap().last_error.clone());
            dependencies.push(DependencyHealth {
                name: name.clone(),
                state: *state,
                last_error,
                uptime_pct,
            });
        }

        let fallback_exercised = self.fallback_recently_exercised.swap(false, std::sync::atomic::Ordering::Relaxed);
        let status = if any_critical_open {
            OverallStatus::Critical
        } else if any_noncritical_open || fallback_exercised {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        };

        HealthReport { status, dependencies }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience::CircuitBreakerConfig;
    use std::time::Duration;

    #[test]
    fn critical_dependency_open_marks_critical() {
        let manager = Arc::new(CircuitBreakerManager::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(30),
        }));
        let aggregator = HealthAggregator::new(manager.clone());
        manager.get_or_create("vector-index").record_failure();
        let report = aggregator.report();
        assert_eq!(report.status, OverallStatus::Critical);
    }

    #[test]
    fn noncritical_dependency_open_marks_degraded() {
        let manager = Arc::new(CircuitBreakerManager::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(30),
        }));
        let aggregator = HealthAggregator::new(manager.clone());
        manager.get_or_create("completion").record_failure();
        let report = aggregator.report();
        assert_eq!(report.status, OverallStatus::Degraded);
    }

    #[test]
    fn healthy_when_all_closed() {
        let manager = Arc::new(CircuitBreakerManager::default());
        let aggregator = HealthAggregator::new(manager.clone());
        manager.get_or_create("vector-index");
        let report = aggregator.report();
        assert_eq!(report.status, OverallStatus::Healthy);
    }
}
