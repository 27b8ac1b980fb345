//! Web evidence gathering: query planning plus fan-out over the search
//! provider.

use std::collections::HashSet;
use std::sync::Arc;

use crate::capabilities::WebSearchProvider;
use crate::prompts::{truncate_at_word, truncate_chars};
use verifact_core::EvidenceItem;

/// Claims longer than this get an extra shortened query variant.
const SHORT_QUERY_THRESHOLD: usize = 80;
/// Character budget for the shortened variant.
const SHORT_QUERY_CAP: usize = 77;
/// Queries issued per claim at most.
const MAX_QUERIES: usize = 4;

/// Generate 2-4 search queries for a claim.
///
/// Rule-based for predictability: the claim as-is, a fact-check framing, a
/// shortened variant for long claims, and a quoted debunk framing to fish
/// for refuting coverage.
pub fn plan_queries(claim: &str) -> Vec<String> {
    let claim = claim.trim();
    if claim.is_empty() {
        return Vec::new();
    }
    let mut queries = vec![claim.to_string(), format!("fact check {claim}")];
    if claim.chars().count() > SHORT_QUERY_THRESHOLD {
        let short = truncate_at_word(claim, SHORT_QUERY_CAP);
        if !short.is_empty() && !queries.iter().any(|q| q == short) {
            queries.push(short.to_string());
        }
    }
    let debunk = format!("\"{claim}\" debunk");
    if !queries.contains(&debunk) {
        queries.push(debunk);
    }
    queries.truncate(MAX_QUERIES);
    queries
}

/// Gathers web evidence for one claim by fanning out planned queries.
pub struct WebAgent {
    provider: Arc<dyn WebSearchProvider>,
    results_per_query: usize,
}

impl WebAgent {
    pub fn new(provider: Arc<dyn WebSearchProvider>, results_per_query: usize) -> Self {
        Self {
            provider,
            results_per_query,
        }
    }

    /// Run all planned queries concurrently and merge their results,
    /// deduplicating by raw URL in query order.
    ///
    /// A failed query contributes nothing; only every query failing yields
    /// an empty set.
    pub async fn gather(&self, claim: &str) -> Vec<EvidenceItem> {
        let queries = plan_queries(claim);
        if queries.is_empty() {
            return Vec::new();
        }

        let results = futures::future::join_all(
            queries
                .iter()
                .map(|query| self.provider.search(query, self.results_per_query)),
        )
        .await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut items: Vec<EvidenceItem> = Vec::new();
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(batch) => {
                    for item in batch {
                        let url = item.url.trim();
                        if url.is_empty() || seen.contains(url) {
                            continue;
                        }
                        seen.insert(url.to_string());
                        items.push(item);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        query = truncate_chars(query, 50),
                        error = %error,
                        "search query failed"
                    );
                }
            }
        }
        items
    }
}
