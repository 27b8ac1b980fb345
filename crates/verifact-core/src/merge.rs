//! Evidence merging: union, dedupe, homepage filtering.
//!
//! The merger is the only place evidence is ever dropped mid-loop, and it
//! drops only exact duplicates (by normalized URL) and homepage-class
//! URLs. First occurrence wins, so evidence accumulated in earlier
//! iterations keeps its position ahead of newly gathered items.

use std::collections::HashSet;

use crate::evidence::EvidenceItem;
use crate::url::{self, UrlClassifier};

/// Union `prior` and `incoming` evidence into one deduplicated pool.
///
/// Items with empty URLs are discarded; duplicates (same normalized URL)
/// keep the first occurrence; homepage/category URLs are dropped per the
/// classifier.
pub fn merge(
    prior: Vec<EvidenceItem>,
    incoming: Vec<EvidenceItem>,
    classifier: &dyn UrlClassifier,
) -> Vec<EvidenceItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<EvidenceItem> = Vec::with_capacity(prior.len() + incoming.len());
    let mut duplicates = 0usize;
    let mut homepages = 0usize;

    for item in prior.into_iter().chain(incoming) {
        let trimmed = item.url.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = url::normalize(trimmed);
        if seen.contains(&key) {
            duplicates += 1;
            continue;
        }
        if classifier.is_homepage(trimmed) {
            homepages += 1;
            continue;
        }
        seen.insert(key);
        out.push(item);
    }

    tracing::debug!(
        kept = out.len(),
        duplicates,
        homepages,
        "merged evidence pool"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::SourceKind;
    use crate::url::RuleBasedUrlClassifier;
    use proptest::prelude::*;

    fn item(url: &str, source: SourceKind) -> EvidenceItem {
        EvidenceItem::new(url, "title", "snippet", source)
    }

    #[test]
    fn test_dedupes_by_normalized_url() {
        let merged = merge(
            vec![item("https://a.com/story", SourceKind::Search)],
            vec![
                item("https://A.com/story/", SourceKind::KnowledgeBase),
                item("https://a.com/story#frag", SourceKind::Search),
                item("https://a.com/other-story", SourceKind::Search),
            ],
            &RuleBasedUrlClassifier,
        );
        assert_eq!(merged.len(), 2);
        // First occurrence wins, including its source kind.
        assert_eq!(merged[0].source_kind, SourceKind::Search);
        assert_eq!(merged[0].url, "https://a.com/story");
    }

    #[test]
    fn test_prior_evidence_keeps_position() {
        let merged = merge(
            vec![item("https://a.com/first-story", SourceKind::Search)],
            vec![item("https://b.com/second-story", SourceKind::Search)],
            &RuleBasedUrlClassifier,
        );
        assert_eq!(merged[0].url, "https://a.com/first-story");
        assert_eq!(merged[1].url, "https://b.com/second-story");
    }

    #[test]
    fn test_drops_homepages_and_empty_urls() {
        let merged = merge(
            vec![],
            vec![
                item("https://example.com/", SourceKind::KnowledgeBase),
                item("https://example.com/news", SourceKind::KnowledgeBase),
                item("   ", SourceKind::Search),
                item("https://example.com/real-article-here", SourceKind::Search),
            ],
            &RuleBasedUrlClassifier,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url, "https://example.com/real-article-here");
    }

    proptest! {
        #[test]
        fn prop_no_duplicate_normalized_urls(
            paths in proptest::collection::vec("[a-z]{1,6}-[a-z]{1,6}", 0..40),
            slashes in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let items: Vec<EvidenceItem> = paths
                .iter()
                .zip(slashes.iter().chain(std::iter::repeat(&false)))
                .map(|(p, trailing)| {
                    let url = if *trailing {
                        format!("https://site.com/{p}/")
                    } else {
                        format!("https://site.com/{p}")
                    };
                    item(&url, SourceKind::Search)
                })
                .collect();

            let merged = merge(vec![], items, &RuleBasedUrlClassifier);

            let mut keys: Vec<String> =
                merged.iter().map(|i| crate::url::normalize(&i.url)).collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total);
        }
    }
}
