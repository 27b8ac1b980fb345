//! Deterministic parts of multi-claim aggregation: citation merging and
//! the reasoning fallback. The verdict priority merge lives in
//! [`crate::verdict::aggregate_verdict`].

use std::collections::HashSet;

use crate::result::{Citation, VerificationResult};

/// Citation cap for an aggregated response.
pub const MAX_CITATIONS: usize = 25;

/// Union citations across sub-results in sub-claim order, dedupe by URL
/// (first seen wins), cap at [`MAX_CITATIONS`].
pub fn merge_citations(sub_results: &[VerificationResult]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged: Vec<Citation> = Vec::new();

    for result in sub_results {
        for citation in &result.citations {
            let url = citation.url.trim();
            if url.is_empty() || seen.contains(url) {
                continue;
            }
            seen.insert(url);
            merged.push(citation.clone());
            if merged.len() >= MAX_CITATIONS {
                return merged;
            }
        }
    }
    merged
}

/// Concatenate per-sub-claim reasoning, used when the summarizer is
/// unavailable.
pub fn fallback_summary(sub_results: &[VerificationResult]) -> String {
    if sub_results.is_empty() {
        return "No sub-results to aggregate.".to_string();
    }
    sub_results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let reason = r.reasoning.trim();
            let reason = if reason.is_empty() {
                "No reasoning provided."
            } else {
                reason
            };
            format!("Sub-claim {}: {}", i + 1, reason)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
