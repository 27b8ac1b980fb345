//! # verifact-runtime
//!
//! Async orchestration for the claim-verification pipeline.
//!
//! Where `verifact-core` holds the deterministic logic, this crate runs
//! it: capability traits for language models, web search, vector
//! knowledge stores, embedders, and relevance scoring; HTTP adapters for
//! hosted providers (feature-gated); the per-sub-claim agentic loop; and
//! the [`Pipeline`] front door that ties decomposition, verification, and
//! aggregation together.
//!
//! ## Degradation
//!
//! Every external dependency is optional at runtime except the language
//! model. A provider that fails, times out, or is simply not configured
//! contributes nothing to the evidence pool; with nothing gathered at
//! all, the pipeline still returns a well-formed "Not Enough Evidence"
//! result. Reasoning and summary text degrade to deterministic fallback
//! sentences, never to an error.
//!
//! ## Provider features
//!
//! HTTP adapters are compiled in via cargo features: `openai`, `tavily`,
//! `serp`, and `chroma`, or `all-providers` for the lot. The capability
//! traits themselves are always available, so applications can wire
//! custom backends without any feature.

pub mod agents;
pub mod aggregator;
pub mod cache;
pub mod capabilities;
pub mod decomposer;
pub mod evaluator;
pub mod orchestrator;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod relevance;
pub mod usage;
pub mod verdict_former;

pub use agents::{KnowledgeAgent, WebAgent};
pub use aggregator::VerdictAggregator;
pub use cache::CachedLanguageModel;
pub use capabilities::{
    CapabilityError, CompletionOptions, Embedder, LanguageModel, RelevanceScorer,
    VectorKnowledgeStore, WebSearchProvider,
};
pub use decomposer::ClaimDecomposer;
pub use evaluator::StanceEvaluator;
pub use orchestrator::{SubClaimOutcome, VerificationOrchestrator};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use providers::factory::{SearchProviderFactory, SearchProviderRegistry};
pub use providers::secrets::{ApiCredential, CredentialSource};
pub use relevance::LexicalRelevance;
pub use usage::{TrackedLanguageModel, UsageSnapshot, UsageTracker};
pub use verdict_former::VerdictFormer;
