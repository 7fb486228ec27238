use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Audience targeting hints attached to an [`Assignment`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographic: Option<String>,
}

/// The content brief fed to the matcher. Immutable for the duration of a
/// match call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub topic: String,
    pub key_takeaway: String,
    pub additional_context: String,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub creator_niches: BTreeSet<String>,
    #[serde(default)]
    pub creator_values: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_style: Option<String>,
}

impl Assignment {
    /// Brief text composition per the engine's fixed default: concatenate
    /// `topic`, `keyTakeaway`, and `additionalContext` with single spaces.
    /// Structured filters are deliberately excluded (see design notes).
    pub fn brief_text(&self) -> String {
        format!(
            "{} {} {}",
            self.topic.trim(),
            self.key_takeaway.trim(),
            self.additional_context.trim()
        )
    }

    /// Case-folded `creatorNiches`, used for set intersection.
    pub fn niches_lower(&self) -> BTreeSet<String> {
        self.creator_niches.iter().map(|s| s.to_lowercase()).collect()
    }

    /// Case-folded `creatorValues`, used for set intersection.
    pub fn values_lower(&self) -> BTreeSet<String> {
        self.creator_values.iter().map(|s| s.to_lowercase()).collect()
    }
}

/// Per-modality analysis attached to a catalog creator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorAnalysis {
    pub primary_niches: BTreeSet<String>,
    #[serde(default)]
    pub secondary_niches: BTreeSet<String>,
    #[serde(default)]
    pub apparent_values: BTreeSet<String>,
    #[serde(default)]
    pub audience_interests: BTreeSet<String>,
    #[serde(default)]
    pub engagement_style_tone: BTreeSet<String>,
    #[serde(default)]
    pub summary: String,
}

/// A catalog entry. Tag fields are normalized to lower case at ingest by the
/// catalog cache; this type does not re-normalize on every access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub id: String,
    pub nickname: String,
    pub bio: String,
    pub follower_count: u64,
    #[serde(default)]
    pub heart_count: Option<u64>,
    pub region: String,
    pub analysis: CreatorAnalysis,
}

impl Creator {
    /// Engagement ratio used as the §4.1 tie-break key:
    /// `heartCount / max(1, followerCount)`.
    pub fn engagement_ratio(&self) -> f64 {
        let hearts = self.heart_count.unwrap_or(0) as f64;
        hearts / (self.follower_count.max(1) as f64)
    }

    pub fn region_lower(&self) -> String {
        self.region.to_lowercase()
    }

    pub fn all_niches_lower(&self) -> BTreeSet<String> {
        self.analysis
            .primary_niches
            .iter()
            .chain(self.analysis.secondary_niches.iter())
            .map(|s| s.to_lowercase())
            .collect()
    }

    pub fn apparent_values_lower(&self) -> BTreeSet<String> {
        self.analysis
            .apparent_values
            .iter()
            .map(|s| s.to_lowercase())
            .collect()
    }
}

/// A transient `(creatorId, semanticScore)` pair emerging from a vector
/// query. Discarded after scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub creator_id: &'a str,
    /// Raw cosine similarity, in `[-1, 1]`. Non-finite values are treated as
    /// neutral (0.0) per the scorer's edge-case policy.
    pub semantic_score: f64,
}

/// Per-component score breakdown, used both for ranking and as an
/// explanation surfaced to callers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub semantic_similarity: f64,
    pub niche_alignment: u32,
    pub audience_match: u8,
    pub value_alignment: f64,
    pub niche_boost: f64,
}

/// A scored creator, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub creator: Creator,
    pub match_score: f64,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// The response returned by a single match call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub assignment: Assignment,
    pub matches: Vec<Match>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub is_fallback: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
