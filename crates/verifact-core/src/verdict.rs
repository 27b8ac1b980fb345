//! Verdict decision logic.
//!
//! Both functions here are pure: the same [`EvidenceState`] always yields
//! the same [`Verdict`], and aggregation depends only on the sub-verdicts
//! in order. All non-determinism (retrieval, classification, reasoning
//! text) lives upstream in the runtime crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceState;

/// Terminal verdict for a claim or sub-claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Supported,
    Refuted,
    #[serde(rename = "Not Enough Evidence")]
    NotEnoughEvidence,
    #[serde(rename = "Mixed / Disputed")]
    MixedDisputed,
    Unverifiable,
}

impl Verdict {
    /// The wire/display string for this verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Supported => "Supported",
            Verdict::Refuted => "Refuted",
            Verdict::NotEnoughEvidence => "Not Enough Evidence",
            Verdict::MixedDisputed => "Mixed / Disputed",
            Verdict::Unverifiable => "Unverifiable",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide a verdict from final evidence state.
///
/// Decision table, first matching row wins:
/// 1. no evidence, or below the sufficiency minimum → Not Enough Evidence
/// 2. conflicting stances → Mixed / Disputed
/// 3. only supporting stances → Supported
/// 4. only refuting stances → Refuted
/// 5. one-sided overlap (disparity tunable ruled out conflict) → majority
/// 6. otherwise (all neutral) → Not Enough Evidence
pub fn decide(state: &EvidenceState) -> Verdict {
    if state.total() == 0 || !state.sufficient {
        return Verdict::NotEnoughEvidence;
    }
    if state.conflicted {
        return Verdict::MixedDisputed;
    }
    if state.supporting > 0 && state.refuting == 0 {
        return Verdict::Supported;
    }
    if state.refuting > 0 && state.supporting == 0 {
        return Verdict::Refuted;
    }
    if state.supporting > 0 && state.refuting > 0 {
        return if state.supporting > state.refuting {
            Verdict::Supported
        } else if state.refuting > state.supporting {
            Verdict::Refuted
        } else {
            Verdict::MixedDisputed
        };
    }
    Verdict::NotEnoughEvidence
}

/// Combine sub-claim verdicts into one overall verdict.
///
/// Priority: any Refuted wins, then any Mixed / Disputed, then
/// all-Supported, then all-(Not Enough Evidence | Unverifiable); any
/// other mixture is Mixed / Disputed.
pub fn aggregate_verdict(verdicts: &[Verdict]) -> Verdict {
    if verdicts.is_empty() {
        return Verdict::NotEnoughEvidence;
    }
    if verdicts.contains(&Verdict::Refuted) {
        return Verdict::Refuted;
    }
    if verdicts.contains(&Verdict::MixedDisputed) {
        return Verdict::MixedDisputed;
    }
    if verdicts.iter().all(|v| *v == Verdict::Supported) {
        return Verdict::Supported;
    }
    if verdicts
        .iter()
        .all(|v| matches!(v, Verdict::NotEnoughEvidence | Verdict::Unverifiable))
    {
        return Verdict::NotEnoughEvidence;
    }
    Verdict::MixedDisputed
}
