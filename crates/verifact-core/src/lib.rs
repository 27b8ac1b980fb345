//! # verifact-core
//!
//! Deterministic logic for the claim-verification pipeline.
//!
//! This crate holds everything that can be computed without I/O: the
//! data model, configuration, URL classification, evidence merging and
//! reranking math, the verdict decision table, aggregation priority,
//! credibility filtering, and citation validation. The async loop that
//! feeds it lives in `verifact-runtime`.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: the same evidence state always yields the same
//!    verdict; no hidden randomness.
//! 2. **No network**: nothing here performs retrieval or calls a model.
//! 3. **Degradation over failure**: filters fall back rather than empty
//!    a result; validation downgrades verdicts rather than erroring.
//!
//! ## Example
//!
//! ```rust
//! use verifact_core::evidence::{EvidenceState, Stance};
//! use verifact_core::verdict::{decide, Verdict};
//!
//! let stances = [Stance::Supports, Stance::Supports, Stance::Neutral];
//! let state = EvidenceState::derive(&stances, 1, None);
//! assert_eq!(decide(&state), Verdict::Supported);
//! ```

pub mod aggregate;
pub mod claim;
pub mod config;
pub mod credibility;
pub mod decompose;
pub mod evidence;
pub mod merge;
pub mod rerank;
pub mod result;
pub mod url;
pub mod validation;
pub mod verdict;

// Re-export the public model at the crate root.
pub use claim::{Claim, ClaimError, SubClaim, MAX_CLAIM_LENGTH};
pub use config::{ConfigError, VerifierConfig};
pub use evidence::{
    EvaluatedEvidence, EvidenceItem, EvidenceState, ScoredEvidence, SourceKind, Stance,
};
pub use rerank::RerankOptions;
pub use result::{AggregateResult, Citation, VerificationOutcome, VerificationResult};
pub use url::{RuleBasedUrlClassifier, UrlClassifier};
pub use validation::ValidatedVerdict;
pub use verdict::Verdict;
