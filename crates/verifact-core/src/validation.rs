//! Verdict/citation consistency rules, applied last before a result is
//! returned.
//!
//! Two rules: citations may only reference URLs present in the evidence
//! set, and Supported/Refuted require a minimum number of surviving
//! citations. A violation downgrades the verdict instead of erroring, so
//! the pipeline never returns an inconsistent result.

use std::collections::HashSet;

use crate::result::Citation;
use crate::verdict::Verdict;

/// Outcome of the validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVerdict {
    pub verdict: Verdict,
    pub reasoning: String,
    pub citations: Vec<Citation>,
}

/// Enforce citation consistency and the minimum-source rule.
///
/// Citations whose URL is not in `allowed_urls` are dropped. A Supported
/// or Refuted verdict with fewer than `min_sources` surviving citations
/// is downgraded to Not Enough Evidence, with a sentence appended to the
/// reasoning; the surviving citations are still returned for
/// transparency.
pub fn apply_validation_rules(
    verdict: Verdict,
    reasoning: String,
    citations: Vec<Citation>,
    allowed_urls: &HashSet<String>,
    min_sources: usize,
) -> ValidatedVerdict {
    let filtered: Vec<Citation> = citations
        .into_iter()
        .filter(|c| allowed_urls.contains(&c.url))
        .collect();

    if !matches!(verdict, Verdict::Supported | Verdict::Refuted) {
        return ValidatedVerdict {
            verdict,
            reasoning,
            citations: filtered,
        };
    }

    if filtered.len() < min_sources {
        let reasoning = if reasoning.is_empty() {
            "Insufficient cited sources; reporting Not Enough Evidence.".to_string()
        } else {
            format!(
                "{reasoning} Insufficient cited sources to support this verdict; \
                 reporting Not Enough Evidence."
            )
        };
        return ValidatedVerdict {
            verdict: Verdict::NotEnoughEvidence,
            reasoning,
            citations: filtered,
        };
    }

    ValidatedVerdict {
        verdict,
        reasoning,
        citations: filtered,
    }
}
