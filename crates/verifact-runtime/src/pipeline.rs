//! The assembled verification pipeline and its builder.
//!
//! A [`Pipeline`] owns every stage: decomposition, the per-sub-claim
//! agentic loop, verdict forming, and aggregation. Capabilities are
//! injected through the builder; only the language model is mandatory,
//! and missing retrieval sources degrade to "Not Enough Evidence" rather
//! than failing construction.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use verifact_core::{Claim, ConfigError, VerificationOutcome, VerificationResult, VerifierConfig};

use crate::agents::{KnowledgeAgent, WebAgent};
use crate::aggregator::VerdictAggregator;
use crate::cache::CachedLanguageModel;
use crate::capabilities::{
    Embedder, LanguageModel, RelevanceScorer, VectorKnowledgeStore, WebSearchProvider,
};
use crate::decomposer::ClaimDecomposer;
use crate::evaluator::StanceEvaluator;
use crate::orchestrator::VerificationOrchestrator;
use crate::relevance::LexicalRelevance;
use crate::usage::{TrackedLanguageModel, UsageSnapshot, UsageTracker};
use crate::verdict_former::VerdictFormer;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("a language model is required; wire one with PipelineBuilder::language_model")]
    MissingLanguageModel,

    #[error("knowledge store and embedder must be configured together")]
    IncompleteKnowledgeStore,
}

/// Builder for [`Pipeline`]. Capabilities default to absent; the
/// relevance scorer defaults to [`LexicalRelevance`].
pub struct PipelineBuilder {
    config: VerifierConfig,
    language_model: Option<Arc<dyn LanguageModel>>,
    search: Option<Arc<dyn WebSearchProvider>>,
    knowledge_store: Option<Arc<dyn VectorKnowledgeStore>>,
    embedder: Option<Arc<dyn Embedder>>,
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl PipelineBuilder {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            language_model: None,
            search: None,
            knowledge_store: None,
            embedder: None,
            scorer: None,
        }
    }

    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    pub fn search_provider(mut self, provider: Arc<dyn WebSearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn knowledge_store(mut self, store: Arc<dyn VectorKnowledgeStore>) -> Self {
        self.knowledge_store = Some(store);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn relevance_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Validate the configuration and assemble the pipeline.
    ///
    /// The language model is wrapped with the response cache (when
    /// enabled) and usage tracking before any stage sees it.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        self.config.validate()?;
        let model = self
            .language_model
            .ok_or(PipelineError::MissingLanguageModel)?;
        if self.knowledge_store.is_some() != self.embedder.is_some() {
            return Err(PipelineError::IncompleteKnowledgeStore);
        }

        let tracker = Arc::new(UsageTracker::new());
        let model: Arc<dyn LanguageModel> = if self.config.cache.enabled {
            Arc::new(CachedLanguageModel::new(
                model,
                self.config.cache.capacity,
                self.config.cache.ttl,
            ))
        } else {
            model
        };
        let model: Arc<dyn LanguageModel> =
            Arc::new(TrackedLanguageModel::new(model, Arc::clone(&tracker)));

        let scorer = self
            .scorer
            .unwrap_or_else(|| Arc::new(LexicalRelevance) as Arc<dyn RelevanceScorer>);
        let web = self
            .search
            .map(|provider| WebAgent::new(provider, self.config.retrieval.results_per_query));
        let knowledge = match (self.knowledge_store, self.embedder) {
            (Some(store), Some(embedder)) => Some(KnowledgeAgent::new(
                store,
                embedder,
                &self.config.retrieval,
            )),
            _ => None,
        };

        let decomposer =
            ClaimDecomposer::new(Some(Arc::clone(&model)), self.config.decompose.clone());
        let evaluator = StanceEvaluator::new(Some(Arc::clone(&model)), &self.config);
        let former = VerdictFormer::new(Some(Arc::clone(&model)), &self.config);
        let aggregator = VerdictAggregator::new(Some(model));
        let orchestrator = VerificationOrchestrator::new(
            web,
            knowledge,
            scorer,
            evaluator,
            self.config,
            Arc::clone(&tracker),
        );

        Ok(Pipeline {
            decomposer,
            orchestrator,
            former,
            aggregator,
            tracker,
        })
    }
}

/// A ready-to-run claim-verification pipeline.
pub struct Pipeline {
    decomposer: ClaimDecomposer,
    orchestrator: VerificationOrchestrator,
    former: VerdictFormer,
    aggregator: VerdictAggregator,
    tracker: Arc<UsageTracker>,
}

impl Pipeline {
    pub fn builder(config: VerifierConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Verify one claim end to end.
    ///
    /// A claim that decomposes into several sub-claims is verified
    /// concurrently, one loop per sub-claim, and the results are
    /// aggregated; otherwise the single result is returned flat.
    pub async fn verify(&self, claim: &Claim) -> VerificationOutcome {
        let sub_claims = self.decomposer.decompose(claim).await;
        if sub_claims.len() == 1 {
            let result = self.verify_single(&sub_claims[0].text).await;
            return VerificationOutcome::Single(result);
        }

        let runs = sub_claims
            .iter()
            .map(|sub| self.verify_single(&sub.text));
        let sub_results: Vec<VerificationResult> = join_all(runs).await;
        let aggregate = self.aggregator.combine(claim.as_str(), sub_results).await;
        VerificationOutcome::Aggregate(aggregate)
    }

    /// Counters accumulated since construction (or the last reset).
    pub fn usage(&self) -> UsageSnapshot {
        self.tracker.snapshot()
    }

    pub fn reset_usage(&self) {
        self.tracker.reset();
    }

    async fn verify_single(&self, claim_text: &str) -> VerificationResult {
        let outcome = self.orchestrator.verify_sub_claim(claim_text).await;
        self.former
            .form(claim_text, &outcome.evidence, &outcome.state)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use verifact_core::{EvidenceItem, SourceKind, Verdict};

    use crate::capabilities::{CapabilityError, CompletionOptions};

    /// Answers each prompt kind by its trailing marker. Stance labels
    /// refute when the claim under classification mentions 1920.
    struct ScriptedModel;

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            if prompt.ends_with("Output (JSON array of strings only):") {
                return Ok(concat!(
                    "[\"The Eiffel Tower is in Paris\", ",
                    "\"The Eiffel Tower was built in 1920\"]"
                )
                .to_string());
            }
            if prompt.contains("SOURCES (one per line, prefixed by index):") {
                let label = if prompt.contains("1920") { "refutes" } else { "supports" };
                return Ok(format!("[\"{label}\", \"{label}\"]"));
            }
            if prompt.ends_with("Reasoning:") {
                return Ok("Checked against the gathered sources.".to_string());
            }
            if prompt.ends_with("Summary:") {
                return Ok("One part holds up; the other does not.".to_string());
            }
            Err(CapabilityError::Parse("unexpected prompt".to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Two fixed articles regardless of query.
    struct StaticSearch;

    #[async_trait]
    impl WebSearchProvider for StaticSearch {
        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<EvidenceItem>, CapabilityError> {
            Ok(vec![
                EvidenceItem::new(
                    "https://landmarks.example.com/articles/eiffel-location",
                    "Eiffel location",
                    "The Eiffel Tower stands in Paris, France.",
                    SourceKind::Search,
                ),
                EvidenceItem::new(
                    "https://history.example.com/articles/eiffel-construction",
                    "Eiffel construction",
                    "Construction finished in 1889.",
                    SourceKind::Search,
                ),
            ])
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::builder(VerifierConfig::default())
            .language_model(Arc::new(ScriptedModel))
            .search_provider(Arc::new(StaticSearch))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn short_claim_returns_a_flat_result() {
        let pipeline = pipeline();
        let claim = Claim::new("Paris hosts the Eiffel Tower.").unwrap();

        let outcome = pipeline.verify(&claim).await;
        let VerificationOutcome::Single(result) = outcome else {
            panic!("expected a flat result for an undecomposed claim");
        };
        assert_eq!(result.verdict, Verdict::Supported);
        assert_eq!(result.reasoning, "Checked against the gathered sources.");
        assert_eq!(result.citations.len(), 2);

        let snap = pipeline.usage();
        // One stance batch and one reasoning call; decomposition was
        // skipped below the length threshold.
        assert_eq!(snap.llm_calls, 2);
        assert_eq!(snap.search_calls, 1);
        assert_eq!(snap.search_results, 2);
    }

    #[tokio::test]
    async fn compound_claim_aggregates_with_refuted_dominating() {
        let pipeline = pipeline();
        let claim =
            Claim::new("The Eiffel Tower is in Paris and the Eiffel Tower was built in 1920.")
                .unwrap();

        let outcome = pipeline.verify(&claim).await;
        let VerificationOutcome::Aggregate(aggregate) = outcome else {
            panic!("expected an aggregate for a decomposed claim");
        };
        assert_eq!(aggregate.verdict, Verdict::Refuted);
        assert_eq!(aggregate.sub_results.len(), 2);
        assert_eq!(aggregate.sub_results[0].verdict, Verdict::Supported);
        assert_eq!(aggregate.sub_results[1].verdict, Verdict::Refuted);
        assert_eq!(aggregate.reasoning, "One part holds up; the other does not.");
        // Both sub-claims cite the same two articles; the union dedupes.
        assert_eq!(aggregate.citations.len(), 2);
    }

    #[tokio::test]
    async fn no_retrieval_sources_yields_not_enough_evidence() {
        let pipeline = Pipeline::builder(VerifierConfig::default())
            .language_model(Arc::new(ScriptedModel))
            .build()
            .unwrap();
        let claim = Claim::new("Paris hosts the Eiffel Tower.").unwrap();

        let outcome = pipeline.verify(&claim).await;
        assert_eq!(outcome.verdict(), Verdict::NotEnoughEvidence);
        assert!(outcome.citations().is_empty());
        assert_eq!(
            outcome.reasoning(),
            "Evidence was evaluated against the claim; see citations for sources."
        );
    }

    #[tokio::test]
    async fn missing_language_model_fails_the_build() {
        let result = Pipeline::builder(VerifierConfig::default()).build();
        assert!(matches!(result, Err(PipelineError::MissingLanguageModel)));
    }

    #[tokio::test]
    async fn knowledge_store_without_embedder_fails_the_build() {
        struct NullStore;

        #[async_trait]
        impl crate::capabilities::VectorKnowledgeStore for NullStore {
            async fn query(
                &self,
                _collection: &str,
                _embedding: &[f32],
                _top_k: usize,
            ) -> Result<Vec<EvidenceItem>, CapabilityError> {
                Ok(Vec::new())
            }

            fn name(&self) -> &str {
                "null"
            }
        }

        let result = Pipeline::builder(VerifierConfig::default())
            .language_model(Arc::new(ScriptedModel))
            .knowledge_store(Arc::new(NullStore))
            .build();
        assert!(matches!(result, Err(PipelineError::IncompleteKnowledgeStore)));
    }

    #[tokio::test]
    async fn usage_reset_zeroes_the_counters() {
        let pipeline = pipeline();
        let claim = Claim::new("Paris hosts the Eiffel Tower.").unwrap();
        pipeline.verify(&claim).await;
        assert!(pipeline.usage().llm_calls > 0);

        pipeline.reset_usage();
        assert_eq!(pipeline.usage(), UsageSnapshot::default());
    }
}
