//! Claim intake: normalization, validation, and sub-claim types.
//!
//! A [`Claim`] is the only way text enters the pipeline. Construction
//! normalizes whitespace and enforces the length bound, so everything
//! downstream can assume pre-validated input.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Maximum accepted claim length in characters, post-normalization.
pub const MAX_CLAIM_LENGTH: usize = 2000;

/// Errors rejecting raw input at the intake boundary.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimError {
    #[error("claim is empty after normalization")]
    Empty,

    #[error("claim exceeds {MAX_CLAIM_LENGTH} characters (got {0})")]
    TooLong(usize),
}

/// A normalized, length-bounded factual claim. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Claim(String);

impl Claim {
    /// Normalize raw text and validate it into a claim.
    ///
    /// Trims leading/trailing whitespace and collapses internal runs to
    /// single spaces. Rejects input that is empty after normalization or
    /// longer than [`MAX_CLAIM_LENGTH`] characters.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ClaimError> {
        let normalized = normalize(text.as_ref());
        if normalized.is_empty() {
            return Err(ClaimError::Empty);
        }
        let chars = normalized.chars().count();
        if chars > MAX_CLAIM_LENGTH {
            return Err(ClaimError::TooLong(chars));
        }
        Ok(Self(normalized))
    }

    /// The normalized claim text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters of the normalized text.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One atomic factual assertion extracted from a claim.
///
/// The index records original decomposition order; aggregation and
/// citation merging preserve it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubClaim {
    /// Position within the decomposition, starting at 0.
    pub index: usize,

    /// The assertion text (already normalized by intake).
    pub text: String,
}

impl SubClaim {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
