//! Stance classification of reranked evidence against a claim.
//!
//! Evidence is sent to the language model in fixed-size batches; a failed
//! batch degrades to neutral stances so one bad call cannot sink the
//! whole evaluation.

use std::sync::Arc;

use verifact_core::config::VerifierConfig;
use verifact_core::{EvaluatedEvidence, EvidenceState, ScoredEvidence, Stance};

use crate::capabilities::LanguageModel;

pub struct StanceEvaluator {
    model: Option<Arc<dyn LanguageModel>>,
    batch_size: usize,
    min_sources: usize,
    conflict_disparity: Option<f32>,
}

impl StanceEvaluator {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, config: &VerifierConfig) -> Self {
        Self {
            model,
            batch_size: config.evaluation.stance_batch_size.max(1),
            min_sources: config.pipeline.min_sources_for_verdict,
            conflict_disparity: config.pipeline.conflict_disparity_ratio,
        }
    }

    /// Classify each evidence item's stance toward `claim` and derive the
    /// aggregate state the verdict table reads.
    pub async fn evaluate(
        &self,
        claim: &str,
        evidence: Vec<ScoredEvidence>,
    ) -> (Vec<EvaluatedEvidence>, EvidenceState) {
        if evidence.is_empty() {
            let state = EvidenceState::derive(&[], self.min_sources, self.conflict_disparity);
            return (Vec::new(), state);
        }

        let snippets: Vec<String> = evidence
            .iter()
            .map(|scored| {
                if scored.item.snippet.is_empty() {
                    scored.item.title.clone()
                } else {
                    scored.item.snippet.clone()
                }
            })
            .collect();

        let stances = match &self.model {
            Some(model) => self.classify_in_batches(model.as_ref(), claim, &snippets).await,
            None => vec![Stance::Neutral; snippets.len()],
        };

        let state = EvidenceState::derive(&stances, self.min_sources, self.conflict_disparity);
        let evaluated = evidence
            .into_iter()
            .zip(stances)
            .map(|(scored, stance)| EvaluatedEvidence { scored, stance })
            .collect();
        (evaluated, state)
    }

    async fn classify_in_batches(
        &self,
        model: &dyn LanguageModel,
        claim: &str,
        snippets: &[String],
    ) -> Vec<Stance> {
        let mut stances = Vec::with_capacity(snippets.len());
        for chunk in snippets.chunks(self.batch_size) {
            match model.classify_batch(claim, chunk).await {
                Ok(batch) => stances.extend(batch),
                Err(error) => {
                    tracing::warn!(
                        batch_len = chunk.len(),
                        error = %error,
                        "stance batch failed, treating items as neutral"
                    );
                    stances.extend(std::iter::repeat(Stance::Neutral).take(chunk.len()));
                }
            }
        }
        stances
    }
}
