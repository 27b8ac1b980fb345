//! Hybrid reranking: composite scoring plus domain diversification.
//!
//! `composite = 0.7·relevance + 0.2·url_quality + 0.1·source_preference`.
//! Relevance comes from the runtime's pairwise scorer and is passed in
//! pre-computed, which keeps this module synchronous and deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::evidence::{EvidenceItem, ScoredEvidence, SourceKind};
use crate::url;

pub const RELEVANCE_WEIGHT: f32 = 0.7;
pub const QUALITY_WEIGHT: f32 = 0.2;
pub const SOURCE_WEIGHT: f32 = 0.1;

/// Source-preference term: live search results over knowledge-base hits.
pub const SEARCH_SOURCE_SCORE: f32 = 1.0;
pub const KNOWLEDGE_BASE_SOURCE_SCORE: f32 = 0.5;

/// Neutral relevance used when no pairwise score is available.
pub const NEUTRAL_RELEVANCE: f32 = 0.5;

/// Tunables for one rerank pass.
#[derive(Debug, Clone, Copy)]
pub struct RerankOptions {
    /// Survivors kept after scoring and diversification.
    pub top_n: usize,

    /// Maximum items sharing one domain, applied in rank order.
    pub per_domain_cap: usize,

    /// Quality term for shallow or unparseable URLs.
    pub ambiguous_quality: f32,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            top_n: 8,
            per_domain_cap: 2,
            ambiguous_quality: 0.5,
        }
    }
}

/// Score, sort, diversify, and truncate merged evidence.
///
/// `relevance` holds one pairwise score per item, in item order; missing
/// trailing entries fall back to [`NEUTRAL_RELEVANCE`]. Ordering is by
/// composite score descending, ties broken toward the higher source
/// preference, then original insertion order.
pub fn rerank(
    items: Vec<EvidenceItem>,
    relevance: &[f32],
    opts: &RerankOptions,
) -> Vec<ScoredEvidence> {
    let mut scored: Vec<ScoredEvidence> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let rel = relevance.get(i).copied().unwrap_or(NEUTRAL_RELEVANCE);
            score(item, rel, opts.ambiguous_quality)
        })
        .collect();

    scored.sort_by(compare);
    diversify(scored, opts.per_domain_cap, opts.top_n)
}

/// Build scored evidence without reordering.
///
/// Degraded path for when the relevance scorer is unavailable: every
/// item gets [`NEUTRAL_RELEVANCE`] and the merged order is kept, so the
/// pipeline continues with the evidence it has.
pub fn score_preserving_order(items: Vec<EvidenceItem>, opts: &RerankOptions) -> Vec<ScoredEvidence> {
    items
        .into_iter()
        .map(|item| score(item, NEUTRAL_RELEVANCE, opts.ambiguous_quality))
        .collect()
}

fn score(item: EvidenceItem, relevance: f32, ambiguous_quality: f32) -> ScoredEvidence {
    let relevance = relevance.clamp(0.0, 1.0);
    let quality = url::article_quality(&item.url, ambiguous_quality);
    let source = match item.source_kind {
        SourceKind::Search => SEARCH_SOURCE_SCORE,
        SourceKind::KnowledgeBase => KNOWLEDGE_BASE_SOURCE_SCORE,
    };
    let composite = RELEVANCE_WEIGHT * relevance + QUALITY_WEIGHT * quality + SOURCE_WEIGHT * source;
    ScoredEvidence {
        item,
        relevance_score: relevance,
        quality_score: quality,
        source_score: source,
        composite_score: composite,
    }
}

fn compare(a: &ScoredEvidence, b: &ScoredEvidence) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then(b.source_score.total_cmp(&a.source_score))
}

/// Apply the per-domain cap in rank order, then truncate to `top_n`.
/// Items without a parseable domain are never capped against each other.
fn diversify(scored: Vec<ScoredEvidence>, per_domain_cap: usize, top_n: usize) -> Vec<ScoredEvidence> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(top_n.min(scored.len()));

    for ev in scored {
        if out.len() == top_n {
            break;
        }
        match url::domain(&ev.item.url) {
            Some(dom) => {
                let count = counts.entry(dom).or_insert(0);
                if *count >= per_domain_cap {
                    continue;
                }
                *count += 1;
                out.push(ev);
            }
            None => out.push(ev),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, source: SourceKind) -> EvidenceItem {
        EvidenceItem::new(url, "t", "s", source)
    }

    #[test]
    fn test_composite_weights() {
        let scored = rerank(
            vec![item("https://a.com/x/y", SourceKind::Search)],
            &[1.0],
            &RerankOptions::default(),
        );
        // 0.7·1.0 + 0.2·1.0 + 0.1·1.0
        assert!((scored[0].composite_score - 1.0).abs() < 1e-6);

        let kb = rerank(
            vec![item("https://a.com/x/y", SourceKind::KnowledgeBase)],
            &[0.0],
            &RerankOptions::default(),
        );
        // 0.7·0.0 + 0.2·1.0 + 0.1·0.5
        assert!((kb[0].composite_score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_orders_by_composite_descending() {
        let scored = rerank(
            vec![
                item("https://low.com/a/b", SourceKind::Search),
                item("https://high.com/a/b", SourceKind::Search),
            ],
            &[0.1, 0.9],
            &RerankOptions::default(),
        );
        assert_eq!(url::domain(&scored[0].item.url).unwrap(), "high.com");
    }

    #[test]
    fn test_tie_prefers_search_source() {
        // Same relevance and quality; source preference decides.
        let scored = rerank(
            vec![
                item("https://kb.com/a/b", SourceKind::KnowledgeBase),
                item("https://web.com/a/b", SourceKind::Search),
            ],
            &[0.5, 0.5],
            &RerankOptions::default(),
        );
        assert_eq!(scored[0].item.source_kind, SourceKind::Search);
    }

    #[test]
    fn test_per_domain_cap() {
        let opts = RerankOptions::default();
        let scored = rerank(
            vec![
                item("https://same.com/one-story", SourceKind::Search),
                item("https://same.com/two-story", SourceKind::Search),
                item("https://same.com/three-story", SourceKind::Search),
                item("https://other.com/a-story", SourceKind::Search),
            ],
            &[0.9, 0.8, 0.7, 0.1],
            &opts,
        );
        let same_count = scored
            .iter()
            .filter(|s| url::domain(&s.item.url).as_deref() == Some("same.com"))
            .count();
        assert_eq!(same_count, 2);
        assert_eq!(scored.len(), 3);
        // Cap keeps the two highest-ranked items from the capped domain.
        assert_eq!(scored[0].item.url, "https://same.com/one-story");
        assert_eq!(scored[1].item.url, "https://same.com/two-story");
    }

    #[test]
    fn test_truncates_to_top_n() {
        let opts = RerankOptions {
            top_n: 2,
            ..Default::default()
        };
        let items: Vec<EvidenceItem> = (0..5)
            .map(|i| item(&format!("https://s{i}.com/a-story"), SourceKind::Search))
            .collect();
        let scored = rerank(items, &[0.5, 0.6, 0.7, 0.8, 0.9], &opts);
        assert_eq!(scored.len(), 2);
        assert!(scored[0].relevance_score > scored[1].relevance_score);
    }

    #[test]
    fn test_missing_relevance_defaults_neutral() {
        let scored = rerank(
            vec![
                item("https://a.com/x/y", SourceKind::Search),
                item("https://b.com/x/y", SourceKind::Search),
            ],
            &[0.9],
            &RerankOptions::default(),
        );
        assert!((scored[1].relevance_score - NEUTRAL_RELEVANCE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_score_preserving_order_keeps_order() {
        let scored = score_preserving_order(
            vec![
                item("https://z.com/low-quality", SourceKind::KnowledgeBase),
                item("https://a.com/x/y", SourceKind::Search),
            ],
            &RerankOptions::default(),
        );
        assert_eq!(scored[0].item.url, "https://z.com/low-quality");
        assert_eq!(scored.len(), 2);
    }
}
