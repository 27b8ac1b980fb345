//! Evidence data model for the verification pipeline.
//!
//! An [`EvidenceItem`] is created during gathering and never mutated after
//! merge; scoring and stance classification attach derived wrappers
//! ([`ScoredEvidence`], [`EvaluatedEvidence`]) instead of editing the item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which retrieval strategy produced an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Live web-search provider.
    Search,
    /// Vector knowledge store.
    KnowledgeBase,
}

/// An evidence item's relationship to the claim under verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Supports,
    Refutes,
    Neutral,
}

impl Stance {
    /// Parse a classifier label leniently.
    ///
    /// Unrecognized labels map to `Neutral` so a sloppy classifier can
    /// never invent support or refutation.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "supports" | "support" | "supported" => Stance::Supports,
            "refutes" | "refute" | "refuted" => Stance::Refutes,
            _ => Stance::Neutral,
        }
    }
}

/// One retrieved document fragment with source metadata.
///
/// Uniqueness key across the pipeline is the normalized URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Source URL as returned by the provider.
    pub url: String,

    /// Document or page title.
    pub title: String,

    /// Text fragment used for relevance scoring and stance classification.
    pub snippet: String,

    /// Which retrieval strategy produced this item.
    pub source_kind: SourceKind,

    /// Publication timestamp, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Provider-reported retrieval score, unnormalized.
    pub retrieval_score: f32,
}

impl EvidenceItem {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
        source_kind: SourceKind,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
            source_kind,
            published_at: None,
            retrieval_score: 0.0,
        }
    }

    /// Attach a publication timestamp.
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Attach the provider's retrieval score.
    pub fn with_retrieval_score(mut self, score: f32) -> Self {
        self.retrieval_score = score;
        self
    }
}

/// Evidence after reranking: the item plus its scoring breakdown.
///
/// Ordering is by `composite_score` descending; ties break toward the
/// higher `source_score`, then insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub item: EvidenceItem,

    /// Pairwise claim/snippet relevance in [0, 1].
    pub relevance_score: f32,

    /// URL quality: 1.0 for article-specific URLs, lower for ambiguous.
    pub quality_score: f32,

    /// Source preference: search-originated over knowledge-base.
    pub source_score: f32,

    /// Weighted blend of the three terms, used for ranking.
    pub composite_score: f32,
}

/// Scored evidence with its terminal stance annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedEvidence {
    pub scored: ScoredEvidence,
    pub stance: Stance,
}

impl EvaluatedEvidence {
    pub fn item(&self) -> &EvidenceItem {
        &self.scored.item
    }
}

/// The per-sub-claim working state the agentic loop accumulates.
///
/// Derived fresh from the full evidence pool at the end of each
/// iteration; the pool itself only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvidenceState {
    pub supporting: usize,
    pub refuting: usize,
    pub neutral: usize,

    /// Evidence count reached the configured minimum.
    pub sufficient: bool,

    /// Supporting and refuting stances are both present and neither side
    /// dominates enough to call the state one-sided.
    pub conflicted: bool,
}

impl EvidenceState {
    /// Derive state from classified stances.
    ///
    /// `min_sources` sets the sufficiency floor. `conflict_disparity`
    /// tunes conflict detection: `None` means any overlap of supporting
    /// and refuting stances is a conflict; `Some(r)` treats the state as
    /// one-sided (not conflicted) when the majority side has at least
    /// `r` times the minority's count.
    pub fn derive(stances: &[Stance], min_sources: usize, conflict_disparity: Option<f32>) -> Self {
        let supporting = stances.iter().filter(|s| **s == Stance::Supports).count();
        let refuting = stances.iter().filter(|s| **s == Stance::Refutes).count();
        let neutral = stances.iter().filter(|s| **s == Stance::Neutral).count();

        let total = supporting + refuting + neutral;
        let sufficient = total >= min_sources && total > 0;

        let both_present = supporting > 0 && refuting > 0;
        let conflicted = match conflict_disparity {
            _ if !both_present => false,
            None => true,
            Some(ratio) => {
                let majority = supporting.max(refuting) as f32;
                let minority = supporting.min(refuting) as f32;
                majority < ratio * minority
            }
        };

        Self {
            supporting,
            refuting,
            neutral,
            sufficient,
            conflicted,
        }
    }

    /// Total classified evidence count.
    pub fn total(&self) -> usize {
        self.supporting + self.refuting + self.neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_label_parsing() {
        assert_eq!(Stance::from_label("supports"), Stance::Supports);
        assert_eq!(Stance::from_label(" Refutes "), Stance::Refutes);
        assert_eq!(Stance::from_label("SUPPORT"), Stance::Supports);
        assert_eq!(Stance::from_label("neutral"), Stance::Neutral);
        assert_eq!(Stance::from_label("maybe?"), Stance::Neutral);
        assert_eq!(Stance::from_label(""), Stance::Neutral);
    }

    #[test]
    fn test_source_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&SourceKind::KnowledgeBase).unwrap(),
            "\"knowledge_base\""
        );
        assert_eq!(serde_json::to_string(&SourceKind::Search).unwrap(), "\"search\"");
    }

    #[test]
    fn test_derive_counts_and_sufficiency() {
        let stances = [Stance::Supports, Stance::Supports, Stance::Neutral];
        let state = EvidenceState::derive(&stances, 2, None);
        assert_eq!(state.supporting, 2);
        assert_eq!(state.refuting, 0);
        assert_eq!(state.neutral, 1);
        assert!(state.sufficient);
        assert!(!state.conflicted);
    }

    #[test]
    fn test_derive_insufficient_below_minimum() {
        let state = EvidenceState::derive(&[Stance::Supports], 2, None);
        assert!(!state.sufficient);
    }

    #[test]
    fn test_derive_empty_is_never_sufficient() {
        // min_sources = 0 must not mark an empty pool sufficient.
        let state = EvidenceState::derive(&[], 0, None);
        assert!(!state.sufficient);
        assert_eq!(state.total(), 0);
    }

    #[test]
    fn test_conflict_any_overlap_by_default() {
        let stances = [
            Stance::Supports,
            Stance::Supports,
            Stance::Supports,
            Stance::Refutes,
        ];
        let state = EvidenceState::derive(&stances, 1, None);
        assert!(state.conflicted);
    }

    #[test]
    fn test_conflict_disparity_makes_lopsided_state_one_sided() {
        let stances = [
            Stance::Supports,
            Stance::Supports,
            Stance::Supports,
            Stance::Refutes,
        ];
        // 3 >= 2.0 * 1, so the supporting side dominates.
        let state = EvidenceState::derive(&stances, 1, Some(2.0));
        assert!(!state.conflicted);

        // 3 < 4.0 * 1 keeps it a conflict under a stricter ratio.
        let strict = EvidenceState::derive(&stances, 1, Some(4.0));
        assert!(strict.conflicted);
    }

    #[test]
    fn test_evidence_item_builders() {
        let at = Utc::now();
        let item = EvidenceItem::new(
            "https://example.org/story",
            "Story",
            "A snippet.",
            SourceKind::Search,
        )
        .with_published_at(at)
        .with_retrieval_score(0.8);

        assert_eq!(item.published_at, Some(at));
        assert!((item.retrieval_score - 0.8).abs() < f32::EPSILON);
    }
}
