//! Source credibility: domain-allowlist citation filtering with a
//! diversity-preserving fallback.
//!
//! The filter never empties a citation list: when too few citations pass
//! (none, or under 3 and under 30% of the total) the unfiltered list is
//! kept, trading credibility for evidence diversity.

use std::collections::HashSet;

use crate::result::Citation;
use crate::url;

/// Filtered sets smaller than this are candidates for the fallback.
pub const MIN_CREDIBLE_KEEP: usize = 3;

/// Filtered sets below this fraction of the total trigger the fallback.
pub const MIN_CREDIBLE_FRACTION: f32 = 0.3;

/// True when the URL's domain (minus `www.`) is in the allowlist.
/// Malformed URLs are never credible.
pub fn is_credible_url(raw: &str, allowed_domains: &HashSet<String>) -> bool {
    if allowed_domains.is_empty() {
        return false;
    }
    match url::domain(raw) {
        Some(dom) => allowed_domains.contains(&dom),
        None => false,
    }
}

/// Apply the credibility policy to a citation list.
///
/// Keeps only allowlisted domains, preserving order, unless the filtered
/// set is too small per the fallback thresholds, in which case the input
/// list is returned unchanged. An empty allowlist disables filtering.
pub fn apply_credibility_filter(
    citations: Vec<Citation>,
    allowed_domains: &HashSet<String>,
) -> Vec<Citation> {
    if allowed_domains.is_empty() || citations.is_empty() {
        return citations;
    }

    let credible: Vec<Citation> = citations
        .iter()
        .filter(|c| is_credible_url(&c.url, allowed_domains))
        .cloned()
        .collect();

    if credible.is_empty() {
        return citations;
    }
    if credible.len() < MIN_CREDIBLE_KEEP
        && (credible.len() as f32) < citations.len() as f32 * MIN_CREDIBLE_FRACTION
    {
        tracing::info!(
            credible = credible.len(),
            total = citations.len(),
            "credibility filter too restrictive, keeping all citations"
        );
        return citations;
    }
    credible
}
