//! Capability contracts for the external services the pipeline leans on.
//!
//! The verification loop never talks to a concrete vendor. It consumes these
//! traits, and the `providers` module supplies HTTP-backed implementations
//! behind feature flags. Every call site that touches a capability has a
//! defined degraded path, so a failing implementation can never abort a
//! verification; the worst outcome is weaker evidence.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use verifact_core::{EvidenceItem, Stance};

use crate::{parse, prompts};

/// Errors surfaced by capability implementations.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Transport-level failure: connection refused, DNS, TLS.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The provider accepted the request but returned an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider asked us to slow down.
    #[error("rate limited (retry after: {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Response body did not match the expected shape.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The call exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Missing credentials, or the capability was compiled out.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// Tuning knobs for a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; 0.0 requests deterministic output.
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

/// Text generation capability: free-form completion plus two task-shaped
/// operations layered on top of it.
///
/// Implementors only need `complete`; the default `classify_batch` and
/// `summarize` build prompts, call `complete`, and parse tolerantly.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt into free-form text.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError>;

    /// Classify the stance of each snippet toward the claim.
    ///
    /// The returned vector always has exactly `snippets.len()` entries; when
    /// the model returns fewer labels, or labels that are not recognized, the
    /// gaps are filled with [`Stance::Neutral`].
    async fn classify_batch(
        &self,
        claim: &str,
        snippets: &[String],
    ) -> Result<Vec<Stance>, CapabilityError> {
        if snippets.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = prompts::stance_prompt(claim, snippets);
        let options = CompletionOptions {
            max_tokens: 512,
            temperature: 0.0,
        };
        let raw = self.complete(&prompt, &options).await?;
        Ok(parse::stance_labels(&raw, snippets.len()))
    }

    /// Condense several lines of finding text into a short neutral summary.
    async fn summarize(&self, texts: &[String]) -> Result<String, CapabilityError> {
        let prompt = prompts::summary_prompt(texts);
        let options = CompletionOptions {
            max_tokens: 400,
            temperature: 0.3,
        };
        self.complete(&prompt, &options).await
    }

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Live web search capability.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Run one query, returning up to `max_results` items with article URLs
    /// where the provider can supply them.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceItem>, CapabilityError>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Embedding-indexed document store with named collections.
#[async_trait]
pub trait VectorKnowledgeStore: Send + Sync {
    /// Query one collection by embedding, returning the nearest documents.
    ///
    /// A refresh job may swap collection contents between calls, but an
    /// in-progress refresh must never be observable as a partially written
    /// collection; that atomicity is the store's contract, not the caller's.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<EvidenceItem>, CapabilityError>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Text-to-vector capability used to form knowledge-store queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;
}

/// Pairwise relevance scoring between a claim and an evidence snippet.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Score how relevant `snippet` is to `claim`, in `[0.0, 1.0]`.
    async fn score(&self, claim: &str, snippet: &str) -> Result<f32, CapabilityError>;

    /// Score a batch of snippets; the default loops over [`score`](Self::score).
    async fn score_batch(
        &self,
        claim: &str,
        snippets: &[String],
    ) -> Result<Vec<f32>, CapabilityError> {
        let mut scores = Vec::with_capacity(snippets.len());
        for snippet in snippets {
            scores.push(self.score(claim, snippet).await?);
        }
        Ok(scores)
    }
}
