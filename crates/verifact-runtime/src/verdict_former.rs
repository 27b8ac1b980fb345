//! Turning an evaluated evidence set into a final per-claim result:
//! verdict decision, credibility-filtered citations, model-written
//! reasoning, and the consistency rules.

use std::collections::HashSet;
use std::sync::Arc;

use verifact_core::config::VerifierConfig;
use verifact_core::credibility::apply_credibility_filter;
use verifact_core::validation::apply_validation_rules;
use verifact_core::verdict::decide;
use verifact_core::{Citation, EvaluatedEvidence, EvidenceItem, EvidenceState, VerificationResult};

use crate::capabilities::{CompletionOptions, LanguageModel};
use crate::prompts;

/// Reasoning used when no model is available, evidence is empty, or the
/// reasoning call fails.
const DEFAULT_REASONING: &str =
    "Evidence was evaluated against the claim; see citations for sources.";

/// Reasoning used when the model answers with an empty string.
const EMPTY_REASONING: &str = "Evidence was evaluated; see citations.";

pub struct VerdictFormer {
    model: Option<Arc<dyn LanguageModel>>,
    credible_domains: HashSet<String>,
    min_sources: usize,
}

impl VerdictFormer {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, config: &VerifierConfig) -> Self {
        Self {
            model,
            credible_domains: config.credibility.credible_domains.clone(),
            min_sources: config.pipeline.min_sources_for_verdict,
        }
    }

    /// Form the result for one sub-claim from its final evidence state.
    ///
    /// The verdict comes from the decision table alone; the model only
    /// writes the explanatory reasoning, and a failed reasoning call
    /// falls back to boilerplate rather than affecting the verdict.
    pub async fn form(
        &self,
        claim: &str,
        evidence: &[EvaluatedEvidence],
        state: &EvidenceState,
    ) -> VerificationResult {
        let verdict = decide(state);
        let items: Vec<EvidenceItem> = evidence.iter().map(|e| e.item().clone()).collect();

        let citations: Vec<Citation> = items.iter().map(Citation::from_item).collect();
        let citations = apply_credibility_filter(citations, &self.credible_domains);

        let reasoning = self.compose_reasoning(claim, verdict.as_str(), &items).await;

        let allowed: HashSet<String> = items.iter().map(|i| i.url.clone()).collect();
        let validated =
            apply_validation_rules(verdict, reasoning, citations, &allowed, self.min_sources);

        VerificationResult::new(
            claim,
            validated.verdict,
            validated.reasoning,
            validated.citations,
        )
    }

    async fn compose_reasoning(
        &self,
        claim: &str,
        verdict: &str,
        items: &[EvidenceItem],
    ) -> String {
        let Some(model) = &self.model else {
            return DEFAULT_REASONING.to_string();
        };
        if items.is_empty() {
            return DEFAULT_REASONING.to_string();
        }

        let options = CompletionOptions {
            max_tokens: 400,
            temperature: 0.3,
        };
        match model
            .complete(&prompts::reasoning_prompt(claim, verdict, items), &options)
            .await
        {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    EMPTY_REASONING.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "reasoning generation failed");
                DEFAULT_REASONING.to_string()
            }
        }
    }
}
