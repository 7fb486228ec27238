//! Pure hybrid scoring and deterministic ranking.
//!
//! Everything in this crate is a pure function of its arguments: no I/O, no
//! clock reads, no randomness. `score_candidate` turns a `(assignment,
//! creator, semanticScore)` triple into a [`Match`]; `rank` imposes the
//! five-key stable total order over a list of matches.
//!
//! ```
//! use scoring::{score_candidate, ScoringWeights, ScoringWarnings};
//! use scoring::types::{Assignment, Creator, CreatorAnalysis, TargetAudience};
//! use std::collections::BTreeSet;
//!
//! let assignment = Assignment {
//!     topic: "Investing 101".into(),
//!     key_takeaway: "Save more".into(),
//!     additional_context: "Teen audience".into(),
//!     target_audience: TargetAudience::default(),
//!     creator_niches: BTreeSet::new(),
//!     creator_values: BTreeSet::new(),
//!     tone_style: None,
//! };
//! let creator = Creator {
//!     id: "mm".into(),
//!     nickname: "MoneyMentor".into(),
//!     bio: "".into(),
//!     follower_count: 10_000,
//!     heart_count: Some(500),
//!     region: "US".into(),
//!     analysis: CreatorAnalysis::default(),
//! };
//! let m = score_candidate(&assignment, &creator, 0.9, &ScoringWeights::default(), &ScoringWarnings::default());
//! assert!(m.match_score > 0.0 && m.match_score <= 1.0);
//! ```

pub mod ranking;
pub mod types;
pub mod warnings;
pub mod weights;

pub use ranking::rank;
pub use types::{Assignment, Candidate, Creator, CreatorAnalysis, Match, MatchResponse, ScoreBreakdown, TargetAudience};
pub use warnings::ScoringWarnings;
pub use weights::ScoringWeights;

/// Round to four decimal places for stable equality, per the engine
/// contract ("rounded to four decimals for stable equality").
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Score a single candidate against an assignment.
///
/// `semantic_score` is the raw cosine similarity in `[-1, 1]`; non-finite
/// values are treated as neutral (cosine 0) per the edge-case policy.
pub fn score_candidate(
    assignment: &Assignment,
    creator: &Creator,
    semantic_score: f64,
    weights: &ScoringWeights,
    warnings: &ScoringWarnings,
) -> Match {
    if creator.follower_count == 0 && creator.heart_count.unwrap_or(0) > 0 {
        // followerCount == 0 is admissible (non-negative), but a positive
        // heartCount with zero followers is the kind of malformed input the
        // contract asks us to clamp non-fatally and report.
        warnings.record_clamped();
    }

    let cosine = if semantic_score.is_finite() {
        semantic_score.clamp(-1.0, 1.0)
    } else {
        warnings.record_clamped();
        0.0
    };
    let semantic_similarity = (cosine + 1.0) / 2.0;

    let assignment_niches = assignment.niches_lower();
    let creator_niches = creator.all_niches_lower();
    let niche_alignment = assignment_niches.intersection(&creator_niches).count() as u32;

    let niche_match_ratio = if assignment_niches.is_empty() {
        0.0
    } else {
        niche_alignment as f64 / assignment_niches.len().max(1) as f64
    };
    let niche_boost = niche_match_ratio.sqrt();

    let audience_match: u8 = match &assignment.target_audience.locale {
        Some(locale) if !locale.is_empty() => {
            if locale.to_lowercase() == creator.region_lower() {
                1
            } else {
                0
            }
        }
        _ => 0,
    };

    let assignment_values = assignment.values_lower();
    let value_alignment = if assignment_values.is_empty() {
        0.0
    } else {
        let creator_values = creator.apparent_values_lower();
        assignment_values.intersection(&creator_values).count() as f64 / assignment_values.len() as f64
    };

    let base = weights.semantic * semantic_similarity
        + weights.niche * niche_match_ratio
        + weights.audience * audience_match as f64
        + weights.value * value_alignment;
    let match_score = (base * (1.0 + niche_boost)).min(1.0).clamp(0.0, 1.0);

    let breakdown = ScoreBreakdown {
        semantic_similarity: round4(semantic_similarity),
        niche_alignment,
        audience_match,
        value_alignment: round4(value_alignment),
        niche_boost: round4(niche_boost),
    };

    Match {
        creator: creator.clone(),
        match_score: round4(match_score),
        score_breakdown: breakdown,
        reasoning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{CreatorAnalysis, TargetAudience};

    fn assignment(niches: &[&str], values: &[&str], locale: Option<&str>) -> Assignment {
        Assignment {
            topic: "t".into(),
            key_takeaway: "k".into(),
            additional_context: "a".into(),
            target_audience: TargetAudience {
                locale: locale.map(str::to_string),
                demographic: None,
            },
            creator_niches: niches.iter().map(|s| s.to_string()).collect(),
            creator_values: values.iter().map(|s| s.to_string()).collect(),
            tone_style: None,
        }
    }

    fn creator(id: &str, primary: &[&str], values: &[&str], region: &str, followers: u64, hearts: u64) -> Creator {
        Creator {
            id: id.into(),
            nickname: id.into(),
            bio: "".into(),
            follower_count: followers,
            heart_count: Some(hearts),
            region: region.into(),
            analysis: CreatorAnalysis {
                primary_niches: primary.iter().map(|s| s.to_string()).collect(),
                apparent_values: values.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn invariant_match_score_and_niche_boost_bounded() {
        let a = assignment(&["Finance"], &["Honesty"], Some("US"));
        let c = creator("x", &["Finance"], &["Honesty"], "us", 1000, 100);
        let m = score_candidate(&a, &c, 1.0, &ScoringWeights::default(), &ScoringWarnings::default());
        assert!((0.0..=1.0).contains(&m.match_score));
        assert!((0.0..=1.0).contains(&m.score_breakdown.niche_boost));
    }

    #[test]
    fn empty_niches_yield_zero_alignment_and_boost() {
        let a = assignment(&[], &[], None);
        let c = creator("x", &["Finance"], &[], "us", 1000, 0);
        let m = score_candidate(&a, &c, 0.5, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(m.score_breakdown.niche_alignment, 0);
        assert_eq!(m.score_breakdown.niche_boost, 0.0);
    }

    #[test]
    fn locale_match_is_case_insensitive_binary() {
        let a = assignment(&[], &[], Some("CA"));
        let x = creator("x", &[], &[], "ca", 100, 0);
        let y = creator("y", &[], &[], "US", 100, 0);
        let mx = score_candidate(&a, &x, 0.0, &ScoringWeights::default(), &ScoringWarnings::default());
        let my = score_candidate(&a, &y, 0.0, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(mx.score_breakdown.audience_match, 1);
        assert_eq!(my.score_breakdown.audience_match, 0);
    }

    #[test]
    fn boundary_semantic_score_extremes() {
        let a = assignment(&[], &[], None);
        let c = creator("x", &[], &[], "us", 100, 0);
        let lo = score_candidate(&a, &c, -1.0, &ScoringWeights::default(), &ScoringWarnings::default());
        let hi = score_candidate(&a, &c, 1.0, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(lo.score_breakdown.semantic_similarity, 0.0);
        assert_eq!(hi.score_breakdown.semantic_similarity, 1.0);
    }

    #[test]
    fn full_niche_match_saturates_boost_to_one() {
        let a = assignment(&["Home Improvement", "DIY"], &[], None);
        let c = creator("x", &["Home Improvement", "DIY"], &[], "us", 100, 0);
        let m = score_candidate(&a, &c, 0.0, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(m.score_breakdown.niche_boost, 1.0);
    }

    #[test]
    fn non_finite_semantic_score_treated_as_neutral() {
        let a = assignment(&[], &[], None);
        let c = creator("x", &[], &[], "us", 100, 0);
        let m = score_candidate(&a, &c, f64::NAN, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(m.score_breakdown.semantic_similarity, 0.5);
    }

    #[test]
    fn scoring_is_pure_repeated_calls_are_byte_equal() {
        let a = assignment(&["Finance"], &["Honesty"], Some("US"));
        let c = creator("x", &["Finance"], &["Honesty"], "us", 1000, 100);
        let m1 = score_candidate(&a, &c, 0.42, &ScoringWeights::default(), &ScoringWarnings::default());
        let m2 = score_candidate(&a, &c, 0.42, &ScoringWeights::default(), &ScoringWarnings::default());
        assert_eq!(m1.score_breakdown, m2.score_breakdown);
        assert_eq!(m1.match_score, m2.match_score);
    }
}
