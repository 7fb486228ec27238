/// Composite weighting of the four score components. Fixed per the engine
/// contract at `0.7/0.2/0.05/0.05`; kept configurable only so the
/// alternative `0.6/0.2/0.1/0.1` profile mentioned in the design notes can
/// be exercised in tests, not as a runtime-tunable knob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub niche: f64,
    pub audience: f64,
    pub value: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            niche: 0.2,
            audience: 0.05,
            value: 0.05,
        }
    }
}

impl ScoringWeights {
    /// The alternative weighting profile named in the source material but
    /// not adopted as the default.
    pub fn alternative_profile() -> Self {
        Self {
            semantic: 0.6,
            niche: 0.2,
            audience: 0.1,
            value: 0.1,
        }
    }
}
