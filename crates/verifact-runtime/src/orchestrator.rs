//! The per-sub-claim agentic loop: gather, merge, rerank, evaluate,
//! refine.
//!
//! Each iteration gathers from the configured sources concurrently, folds
//! the results into an ever-growing evidence pool, and re-evaluates the
//! full pool. The loop stops early once the evidence state is sufficient
//! and unconflicted; otherwise it widens retrieval and tries again until
//! the iteration budget runs out. Every external call is bounded by the
//! configured timeout, and any source failing or timing out simply
//! contributes nothing that round.

use std::sync::Arc;

use verifact_core::config::VerifierConfig;
use verifact_core::merge::merge;
use verifact_core::rerank::{rerank, score_preserving_order};
use verifact_core::{
    EvaluatedEvidence, EvidenceItem, EvidenceState, RerankOptions, RuleBasedUrlClassifier,
    ScoredEvidence,
};

use crate::agents::{KnowledgeAgent, WebAgent};
use crate::capabilities::RelevanceScorer;
use crate::evaluator::StanceEvaluator;
use crate::usage::UsageTracker;

/// What one run of the loop produced for a single sub-claim.
#[derive(Debug)]
pub struct SubClaimOutcome {
    /// Reranked, stance-annotated evidence from the final evaluation.
    pub evidence: Vec<EvaluatedEvidence>,

    /// Aggregate stance state backing the verdict decision.
    pub state: EvidenceState,

    /// Iterations actually executed (at least 1, at most the budget).
    pub iterations: usize,
}

pub struct VerificationOrchestrator {
    web: Option<WebAgent>,
    knowledge: Option<KnowledgeAgent>,
    scorer: Arc<dyn RelevanceScorer>,
    evaluator: StanceEvaluator,
    classifier: RuleBasedUrlClassifier,
    config: VerifierConfig,
    tracker: Arc<UsageTracker>,
}

impl VerificationOrchestrator {
    pub fn new(
        web: Option<WebAgent>,
        knowledge: Option<KnowledgeAgent>,
        scorer: Arc<dyn RelevanceScorer>,
        evaluator: StanceEvaluator,
        config: VerifierConfig,
        tracker: Arc<UsageTracker>,
    ) -> Self {
        Self {
            web,
            knowledge,
            scorer,
            evaluator,
            classifier: RuleBasedUrlClassifier,
            config,
            tracker,
        }
    }

    /// Run the agentic loop for one sub-claim.
    ///
    /// Never fails: with every source down the outcome carries an empty,
    /// insufficient state, which the verdict table maps to
    /// "Not Enough Evidence".
    pub async fn verify_sub_claim(&self, claim: &str) -> SubClaimOutcome {
        let retrieval = &self.config.retrieval;
        let max_iterations = self.config.pipeline.max_iterations.max(1);
        let mut top_k = retrieval.initial_top_k;

        let mut pool: Vec<EvidenceItem> = Vec::new();
        let mut evidence: Vec<EvaluatedEvidence> = Vec::new();
        let mut state = EvidenceState::derive(
            &[],
            self.config.pipeline.min_sources_for_verdict,
            self.config.pipeline.conflict_disparity_ratio,
        );
        let mut iterations = 0;

        for iteration in 0..max_iterations {
            iterations = iteration + 1;
            let recent_only = iteration >= retrieval.recent_only_after_iteration;

            let (web_items, knowledge_items) = tokio::join!(
                self.gather_web(claim),
                self.gather_knowledge(claim, top_k, recent_only)
            );
            let mut incoming = web_items;
            incoming.extend(knowledge_items);
            pool = merge(pool, incoming, &self.classifier);

            if pool.is_empty() {
                tracing::debug!(iteration, "evidence pool still empty, widening retrieval");
                top_k = (top_k + retrieval.refine_top_k_step).min(retrieval.refine_top_k_ceiling);
                continue;
            }

            let scored = self.rerank_pool(claim, &pool).await;
            let (evaluated, derived) = self.evaluator.evaluate(claim, scored).await;
            evidence = evaluated;
            state = derived;

            if state.sufficient && !state.conflicted {
                tracing::debug!(
                    iteration,
                    supporting = state.supporting,
                    refuting = state.refuting,
                    "evidence settled, stopping early"
                );
                break;
            }
            top_k = (top_k + retrieval.refine_top_k_step).min(retrieval.refine_top_k_ceiling);
        }

        tracing::info!(
            iterations,
            pool = pool.len(),
            evaluated = evidence.len(),
            supporting = state.supporting,
            refuting = state.refuting,
            conflicted = state.conflicted,
            "sub-claim loop finished"
        );
        SubClaimOutcome {
            evidence,
            state,
            iterations,
        }
    }

    /// Composite-rerank the pool; if relevance scoring fails, keep
    /// retrieval order rather than discard the pool.
    async fn rerank_pool(&self, claim: &str, pool: &[EvidenceItem]) -> Vec<ScoredEvidence> {
        let opts = RerankOptions {
            top_n: self.config.rerank.top_n,
            per_domain_cap: self.config.rerank.per_domain_cap,
            ambiguous_quality: self.config.rerank.ambiguous_quality,
        };
        let snippets: Vec<String> = pool
            .iter()
            .map(|item| {
                if item.snippet.is_empty() {
                    item.title.clone()
                } else {
                    item.snippet.clone()
                }
            })
            .collect();
        match self.scorer.score_batch(claim, &snippets).await {
            Ok(relevance) => rerank(pool.to_vec(), &relevance, &opts),
            Err(error) => {
                tracing::warn!(error = %error, "relevance scoring failed, keeping retrieval order");
                score_preserving_order(pool.to_vec(), &opts)
            }
        }
    }

    async fn gather_web(&self, claim: &str) -> Vec<EvidenceItem> {
        let Some(web) = &self.web else {
            return Vec::new();
        };
        match tokio::time::timeout(self.config.pipeline.call_timeout, web.gather(claim)).await {
            Ok(items) => {
                self.tracker.record_search(items.len());
                items
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.pipeline.call_timeout,
                    "web gathering timed out"
                );
                Vec::new()
            }
        }
    }

    async fn gather_knowledge(
        &self,
        claim: &str,
        top_k: usize,
        recent_only: bool,
    ) -> Vec<EvidenceItem> {
        let Some(knowledge) = &self.knowledge else {
            return Vec::new();
        };
        match tokio::time::timeout(
            self.config.pipeline.call_timeout,
            knowledge.gather(claim, top_k, recent_only),
        )
        .await
        {
            Ok(items) => {
                self.tracker.record_knowledge_query(items.len());
                items
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.pipeline.call_timeout,
                    "knowledge gathering timed out"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use verifact_core::verdict::{decide, Verdict};
    use verifact_core::SourceKind;

    use crate::capabilities::{
        CapabilityError, CompletionOptions, LanguageModel, WebSearchProvider,
    };
    use crate::relevance::LexicalRelevance;

    /// Serves one fresh article URL per search call, echoing the claim
    /// back as the snippet so lexical relevance scores it highly.
    struct CountingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WebSearchProvider for CountingSearch {
        async fn search(
            &self,
            query: &str,
            _max_results: usize,
        ) -> Result<Vec<EvidenceItem>, CapabilityError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![EvidenceItem::new(
                format!("https://site{n}.example.com/articles/story-{n}"),
                format!("Story {n}"),
                query.to_string(),
                SourceKind::Search,
            )])
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct StancelessModel;

    #[async_trait]
    impl LanguageModel for StancelessModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            Err(CapabilityError::Http("complete unused".to_string()))
        }

        async fn classify_batch(
            &self,
            _claim: &str,
            snippets: &[String],
        ) -> Result<Vec<verifact_core::Stance>, CapabilityError> {
            Ok(vec![verifact_core::Stance::Neutral; snippets.len()])
        }

        fn name(&self) -> &str {
            "stanceless"
        }
    }

    struct SupportiveModel;

    #[async_trait]
    impl LanguageModel for SupportiveModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            Err(CapabilityError::Http("complete unused".to_string()))
        }

        async fn classify_batch(
            &self,
            _claim: &str,
            snippets: &[String],
        ) -> Result<Vec<verifact_core::Stance>, CapabilityError> {
            Ok(vec![verifact_core::Stance::Supports; snippets.len()])
        }

        fn name(&self) -> &str {
            "supportive"
        }
    }

    fn config(max_iterations: usize, min_sources: usize) -> VerifierConfig {
        let mut config = VerifierConfig::default();
        config.pipeline.max_iterations = max_iterations;
        config.pipeline.min_sources_for_verdict = min_sources;
        config
    }

    fn orchestrator(
        web: Option<WebAgent>,
        model: Option<Arc<dyn LanguageModel>>,
        config: VerifierConfig,
    ) -> VerificationOrchestrator {
        let evaluator = StanceEvaluator::new(model, &config);
        VerificationOrchestrator::new(
            web,
            None,
            Arc::new(LexicalRelevance),
            evaluator,
            config,
            Arc::new(UsageTracker::new()),
        )
    }

    #[tokio::test]
    async fn all_sources_absent_terminates_with_empty_state() {
        let orch = orchestrator(None, None, config(3, 2));
        let outcome = orch.verify_sub_claim("The moon is made of rock").await;

        assert_eq!(outcome.iterations, 3);
        assert!(outcome.evidence.is_empty());
        assert_eq!(outcome.state.total(), 0);
        assert!(!outcome.state.sufficient);
        assert_eq!(decide(&outcome.state), Verdict::NotEnoughEvidence);
    }

    #[tokio::test]
    async fn pool_accumulates_across_iterations() {
        let web = WebAgent::new(
            Arc::new(CountingSearch {
                calls: AtomicUsize::new(0),
            }),
            5,
        );
        // Neutral stances keep the state insufficient for a verdict floor
        // the loop can never reach early, so every iteration runs.
        let orch = orchestrator(Some(web), Some(Arc::new(StancelessModel)), config(2, 100));
        let outcome = orch.verify_sub_claim("The Louvre is in Paris").await;

        assert_eq!(outcome.iterations, 2);
        // Three planned queries per iteration, one fresh URL each; the
        // pool kept iteration 0's items alongside iteration 1's.
        assert_eq!(outcome.evidence.len(), 6);
        let urls: Vec<&str> = outcome.evidence.iter().map(|e| e.item().url.as_str()).collect();
        assert!(urls.iter().any(|u| u.contains("site0.")));
        assert!(urls.iter().any(|u| u.contains("site5.")));
    }

    #[tokio::test]
    async fn sufficient_unconflicted_state_stops_the_loop() {
        let search = Arc::new(CountingSearch {
            calls: AtomicUsize::new(0),
        });
        let web = WebAgent::new(Arc::clone(&search) as Arc<dyn WebSearchProvider>, 5);
        let orch = orchestrator(Some(web), Some(Arc::new(SupportiveModel)), config(3, 1));
        let outcome = orch.verify_sub_claim("The Louvre is in Paris").await;

        assert_eq!(outcome.iterations, 1);
        assert!(outcome.state.sufficient);
        assert!(!outcome.state.conflicted);
        // Only iteration 0's three planned queries ran.
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn scorer_failure_keeps_retrieval_order() {
        struct BrokenScorer;

        #[async_trait]
        impl RelevanceScorer for BrokenScorer {
            async fn score(&self, _claim: &str, _snippet: &str) -> Result<f32, CapabilityError> {
                Err(CapabilityError::Http("scorer offline".to_string()))
            }
        }

        let web = WebAgent::new(
            Arc::new(CountingSearch {
                calls: AtomicUsize::new(0),
            }),
            5,
        );
        let config = config(1, 1);
        let evaluator = StanceEvaluator::new(Some(Arc::new(SupportiveModel)), &config);
        let orch = VerificationOrchestrator::new(
            Some(web),
            None,
            Arc::new(BrokenScorer),
            evaluator,
            config,
            Arc::new(UsageTracker::new()),
        );

        let outcome = orch.verify_sub_claim("The Louvre is in Paris").await;
        let urls: Vec<&str> = outcome.evidence.iter().map(|e| e.item().url.as_str()).collect();
        assert_eq!(urls.len(), 3);
        // Insertion order survives because ranking was skipped.
        assert!(urls[0].contains("site0."));
        assert!(urls[1].contains("site1."));
        assert!(urls[2].contains("site2."));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_search_provider_times_out_to_empty() {
        struct HangingSearch;

        #[async_trait]
        impl WebSearchProvider for HangingSearch {
            async fn search(
                &self,
                _query: &str,
                _max_results: usize,
            ) -> Result<Vec<EvidenceItem>, CapabilityError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }

            fn name(&self) -> &str {
                "hanging"
            }
        }

        let web = WebAgent::new(Arc::new(HangingSearch), 5);
        let mut cfg = config(1, 1);
        cfg.pipeline.call_timeout = Duration::from_secs(5);
        let orch = orchestrator(Some(web), None, cfg);

        let outcome = orch.verify_sub_claim("The Louvre is in Paris").await;
        assert!(outcome.evidence.is_empty());
        assert_eq!(decide(&outcome.state), Verdict::NotEnoughEvidence);
    }

    #[tokio::test]
    async fn usage_tracker_counts_gather_rounds() {
        let tracker = Arc::new(UsageTracker::new());
        let web = WebAgent::new(
            Arc::new(CountingSearch {
                calls: AtomicUsize::new(0),
            }),
            5,
        );
        let cfg = config(2, 100);
        let evaluator = StanceEvaluator::new(Some(Arc::new(StancelessModel)), &cfg);
        let orch = VerificationOrchestrator::new(
            Some(web),
            None,
            Arc::new(LexicalRelevance),
            evaluator,
            cfg,
            Arc::clone(&tracker),
        );

        orch.verify_sub_claim("The Louvre is in Paris").await;
        let snap = tracker.snapshot();
        assert_eq!(snap.search_calls, 2);
        assert_eq!(snap.search_results, 6);
        assert_eq!(snap.knowledge_queries, 0);
    }
}
