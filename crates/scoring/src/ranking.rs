use crate::types::Match;

const SEMANTIC_EPSILON: f64 = 0.01;
const SCORE_EPSILON: f64 = 0.001;

/// Total order over matches: descending by
/// `(nicheAlignment, semanticSimilarity±0.01, matchScore±0.001,
/// engagementRatio, followerCount)`.
///
/// Stable: inputs tying on every key retain their relative input order.
/// Empty input yields an empty output.
pub fn rank(matches: Vec<Match>) -> Vec<Match> {
    let mut ranked = matches;
    ranked.sort_by(|a, b| rank_key_cmp(a, b));
    ranked
}

fn rank_key_cmp(a: &Match, b: &Match) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;

    if a.score_breakdown.niche_alignment != b.score_breakdown.niche_alignment {
        return b.score_breakdown.niche_alignment.cmp(&a.score_breakdown.niche_alignment);
    }

    let semantic_delta = a.score_breakdown.semantic_similarity - b.score_breakdown.semantic_similarity;
    if semantic_delta.abs() > SEMANTIC_EPSILON {
        return if semantic_delta > 0.0 { Less } else { Greater };
    }

    let score_delta = a.match_score - b.match_score;
    if score_delta.abs() > SCORE_EPSILON {
        return if score_delta > 0.0 { Less } else { Greater };
    }

    let engagement_delta = a.creator.engagement_ratio() - b.creator.engagement_ratio();
    if engagement_delta != 0.0 {
        return if engagement_delta > 0.0 { Less } else { Greater };
    }

    b.creator.follower_count.cmp(&a.creator.follower_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Creator, CreatorAnalysis, ScoreBreakdown};

    fn dummy_match(id: &str, niche: u32, semantic: f64, score: f64, hearts: u64, followers: u64) -> Match {
        Match {
            creator: Creator {
                id: id.into(),
                nickname: id.into(),
                bio: "".into(),
                follower_count: followers,
                heart_count: Some(hearts),
                region: "us".into(),
                analysis: CreatorAnalysis::default(),
            },
            match_score: score,
            score_breakdown: ScoreBreakdown {
                semantic_similarity: semantic,
                niche_alignment: niche,
                audience_match: 0,
                value_alignment: 0.0,
                niche_boost: 0.0,
            },
            reasoning: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rank(vec![]).is_empty());
    }

    #[test]
    fn niche_alignment_dominates() {
        let a = dummy_match("a", 2, 0.5, 0.5, 0, 100);
        let b = dummy_match("b", 1, 0.9, 0.9, 0, 100);
        let ranked = rank(vec![b, a]);
        assert_eq!(ranked[0].creator.id, "a");
    }

    #[test]
    fn ties_preserve_input_order() {
        let a = dummy_match("a", 1, 0.5, 0.5, 10, 100);
        let b = dummy_match("b", 1, 0.505, 0.5005, 10, 100);
        let ranked = rank(vec![a.clone(), b.clone()]);
        assert_eq!(ranked[0].creator.id, "a");
        assert_eq!(ranked[1].creator.id, "b");

        let ranked_swapped = rank(vec![b, a]);
        assert_eq!(ranked_swapped[0].creator.id, "b");
        assert_eq!(ranked_swapped[1].creator.id, "a");
    }

    #[test]
    fn engagement_ratio_breaks_ties() {
        let p = dummy_match("p", 1, 0.5, 0.5, 10, 100); // ratio 0.1
        let q = dummy_match("q", 1, 0.5, 0.5, 5, 100); // ratio 0.05
        let ranked = rank(vec![q, p]);
        assert_eq!(ranked[0].creator.id, "p");
    }

    #[test]
    fn rank_is_idempotent() {
        let xs = vec![
            dummy_match("a", 2, 0.9, 0.9, 10, 100),
            dummy_match("b", 1, 0.5, 0.5, 5, 100),
        ];
        let once = rank(xs.clone());
        let twice = rank(once.clone());
        assert_eq!(
            once.iter().map(|m| m.creator.id.clone()).collect::<Vec<_>>(),
            twice.iter().map(|m| m.creator.id.clone()).collect::<Vec<_>>(),
        );
    }
}
