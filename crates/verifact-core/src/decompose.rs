//! Rule-based claim splitting, the deterministic fallback for the
//! language-model decomposer.
//!
//! Splits on sentence boundaries and coordinating conjunctions, discards
//! tiny fragments, and gives up (returns empty) when fewer than two
//! usable fragments emerge so the caller can fall back to the original
//! claim.

use lazy_static::lazy_static;
use regex::Regex;

/// Fragments shorter than this are noise, not assertions.
pub const MIN_FRAGMENT_CHARS: usize = 10;

lazy_static! {
    // Sentence boundary, " and " conjunction, or comma.
    static ref SPLIT_PATTERN: Regex = Regex::new(r"\.\s+|\s+and\s+|\s*,\s*").unwrap();
}

/// Split a claim into candidate sub-claims.
///
/// At most `max_subclaims` fragments are produced (the final fragment
/// absorbs any remainder). Returns an empty vector when splitting yields
/// zero or one usable fragment, since decomposition is only worthwhile
/// when it actually separates assertions.
pub fn split_into_subclaims(claim: &str, max_subclaims: usize) -> Vec<String> {
    if max_subclaims < 2 {
        return Vec::new();
    }

    let fragments: Vec<String> = SPLIT_PATTERN
        .splitn(claim, max_subclaims)
        .map(str::trim)
        .filter(|p| !p.is_empty() && p.chars().count() >= MIN_FRAGMENT_CHARS)
        .map(str::to_string)
        .collect();

    if fragments.len() <= 1 {
        return Vec::new();
    }
    fragments
}
