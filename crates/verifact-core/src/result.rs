//! Public result model: citations, per-claim results, aggregates.

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceItem;
use crate::verdict::Verdict;

/// A cited source in an API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl Citation {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    /// Cite an evidence item. Falls back to the title when the snippet
    /// is empty so a citation always carries some text.
    pub fn from_item(item: &EvidenceItem) -> Self {
        let snippet = if item.snippet.is_empty() {
            item.title.clone()
        } else {
            item.snippet.clone()
        };
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            snippet,
        }
    }
}

/// Verification outcome for one claim or sub-claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub claim: String,
    pub verdict: Verdict,
    pub reasoning: String,
    pub citations: Vec<Citation>,
}

impl VerificationResult {
    pub fn new(
        claim: impl Into<String>,
        verdict: Verdict,
        reasoning: impl Into<String>,
        citations: Vec<Citation>,
    ) -> Self {
        Self {
            claim: claim.into(),
            verdict,
            reasoning: reasoning.into(),
            citations,
        }
    }
}

/// Combined outcome for a decomposed claim: the overall result plus one
/// entry per sub-claim, in original decomposition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub claim: String,
    pub verdict: Verdict,
    pub reasoning: String,
    pub citations: Vec<Citation>,
    pub sub_results: Vec<VerificationResult>,
}

/// What `verify` returns: a plain result for a single claim, or an
/// aggregate when decomposition produced two or more sub-claims.
///
/// Serializes untagged, so a single claim keeps the flat
/// `{claim, verdict, reasoning, citations}` shape and an aggregate adds
/// `sub_results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VerificationOutcome {
    Aggregate(AggregateResult),
    Single(VerificationResult),
}

impl VerificationOutcome {
    /// The overall verdict, regardless of shape.
    pub fn verdict(&self) -> Verdict {
        match self {
            VerificationOutcome::Aggregate(a) => a.verdict,
            VerificationOutcome::Single(s) => s.verdict,
        }
    }

    /// The overall reasoning text.
    pub fn reasoning(&self) -> &str {
        match self {
            VerificationOutcome::Aggregate(a) => &a.reasoning,
            VerificationOutcome::Single(s) => &s.reasoning,
        }
    }

    /// The overall citation list.
    pub fn citations(&self) -> &[Citation] {
        match self {
            VerificationOutcome::Aggregate(a) => &a.citations,
            VerificationOutcome::Single(s) => &s.citations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::SourceKind;

    #[test]
    fn test_citation_snippet_falls_back_to_title() {
        let item = EvidenceItem::new("https://a.com/x", "The Title", "", SourceKind::Search);
        let citation = Citation::from_item(&item);
        assert_eq!(citation.snippet, "The Title");

        let with_snippet =
            EvidenceItem::new("https://a.com/x", "The Title", "Body text", SourceKind::Search);
        assert_eq!(Citation::from_item(&with_snippet).snippet, "Body text");
    }

    #[test]
    fn test_single_outcome_serializes_flat() {
        let outcome = VerificationOutcome::Single(VerificationResult::new(
            "Water is wet",
            Verdict::Supported,
            "Obviously.",
            vec![Citation::new("T", "https://a.com/x", "S")],
        ));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["verdict"], "Supported");
        assert!(json.get("sub_results").is_none());
    }

    #[test]
    fn test_aggregate_outcome_carries_sub_results() {
        let sub = VerificationResult::new("part", Verdict::Refuted, "r", vec![]);
        let outcome = VerificationOutcome::Aggregate(AggregateResult {
            claim: "whole".into(),
            verdict: Verdict::Refuted,
            reasoning: "combined".into(),
            citations: vec![],
            sub_results: vec![sub],
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["sub_results"][0]["verdict"], "Refuted");
        assert_eq!(json["verdict"], "Refuted");
    }
}
