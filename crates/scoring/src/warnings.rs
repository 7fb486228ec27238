use std::sync::atomic::{AtomicU64, Ordering};

/// Observability hook for non-fatal input clamping during scoring (e.g. a
/// negative `followerCount`, a non-finite semantic score). The scorer never
/// errors; this counter is the only trace such input leaves.
#[derive(Debug, Default)]
pub struct ScoringWarnings {
    clamped: AtomicU64,
}

impl ScoringWarnings {
    pub fn record_clamped(&self) {
        self.clamped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clamped_count(&self) -> u64 {
        self.clamped.load(Ordering::Relaxed)
    }
}
