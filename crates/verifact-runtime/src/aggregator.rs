//! Combining per-sub-claim results into one response: verdict priority
//! merge, citation union, and a model-written summary with a
//! deterministic fallback.

use std::sync::Arc;

use verifact_core::aggregate::{fallback_summary, merge_citations};
use verifact_core::verdict::aggregate_verdict;
use verifact_core::{AggregateResult, VerificationResult};

use crate::capabilities::LanguageModel;
use crate::prompts;

/// Reasoning excerpt cap per sub-claim in the summary input.
const REASON_EXCERPT_CHARS: usize = 300;

pub struct VerdictAggregator {
    model: Option<Arc<dyn LanguageModel>>,
}

impl VerdictAggregator {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    /// Combine sub-claim results for `claim` into an aggregate.
    ///
    /// The overall verdict and citations are deterministic; only the
    /// summary text involves the model, and it degrades to concatenated
    /// per-sub-claim reasoning.
    pub async fn combine(
        &self,
        claim: &str,
        sub_results: Vec<VerificationResult>,
    ) -> AggregateResult {
        let verdicts: Vec<_> = sub_results.iter().map(|r| r.verdict).collect();
        let verdict = aggregate_verdict(&verdicts);
        let citations = merge_citations(&sub_results);
        let reasoning = self.summarize(verdict.as_str(), &sub_results).await;

        AggregateResult {
            claim: claim.to_string(),
            verdict,
            reasoning,
            citations,
            sub_results,
        }
    }

    async fn summarize(&self, verdict: &str, sub_results: &[VerificationResult]) -> String {
        let Some(model) = &self.model else {
            return fallback_summary(sub_results);
        };
        if sub_results.is_empty() {
            return fallback_summary(sub_results);
        }

        let mut texts =
            vec![format!("Overall verdict for the combined claim: {verdict}")];
        for (i, result) in sub_results.iter().enumerate() {
            let reason = result.reasoning.trim();
            let reason = if reason.is_empty() {
                "No reasoning provided."
            } else {
                reason
            };
            texts.push(format!(
                "Sub-claim {} verdict: {}. Reasoning: {}",
                i + 1,
                result.verdict.as_str(),
                prompts::truncate_chars(reason, REASON_EXCERPT_CHARS)
            ));
        }

        match model.summarize(&texts).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_summary(sub_results),
            Err(error) => {
                tracing::warn!(error = %error, "aggregate summary failed");
                fallback_summary(sub_results)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use verifact_core::{Citation, Verdict};

    use crate::capabilities::{CapabilityError, CompletionOptions};

    fn sub(claim: &str, verdict: Verdict, reasoning: &str, urls: &[&str]) -> VerificationResult {
        VerificationResult::new(
            claim,
            verdict,
            reasoning,
            urls.iter().map(|u| Citation::new("t", *u, "s")).collect(),
        )
    }

    struct RecordingModel {
        seen: Mutex<Vec<String>>,
        reply: String,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            Err(CapabilityError::Http("complete unused".to_string()))
        }

        async fn summarize(&self, texts: &[String]) -> Result<String, CapabilityError> {
            self.seen.lock().extend_from_slice(texts);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn refuted_sub_claim_dominates() {
        let aggregator = VerdictAggregator::new(None);
        let result = aggregator
            .combine(
                "whole claim",
                vec![
                    sub("a", Verdict::Supported, "fine", &["https://a.com/1"]),
                    sub("b", Verdict::Refuted, "wrong", &["https://b.com/2"]),
                ],
            )
            .await;

        assert_eq!(result.verdict, Verdict::Refuted);
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.sub_results.len(), 2);
    }

    #[tokio::test]
    async fn summary_input_carries_verdicts_and_excerpts() {
        let model = Arc::new(RecordingModel {
            seen: Mutex::new(Vec::new()),
            reply: "Combined: partly true.".to_string(),
        });
        let aggregator = VerdictAggregator::new(Some(model.clone()));
        let result = aggregator
            .combine(
                "whole claim",
                vec![
                    sub("a", Verdict::Supported, "Reason A.", &[]),
                    sub("b", Verdict::NotEnoughEvidence, "", &[]),
                ],
            )
            .await;

        assert_eq!(result.reasoning, "Combined: partly true.");
        let seen = model.seen.lock();
        assert_eq!(
            seen[0],
            "Overall verdict for the combined claim: Mixed / Disputed"
        );
        assert_eq!(seen[1], "Sub-claim 1 verdict: Supported. Reasoning: Reason A.");
        assert_eq!(
            seen[2],
            "Sub-claim 2 verdict: Not Enough Evidence. Reasoning: No reasoning provided."
        );
    }

    #[tokio::test]
    async fn summarizer_failure_falls_back_to_concatenation() {
        struct BrokenModel;

        #[async_trait]
        impl LanguageModel for BrokenModel {
            async fn complete(
                &self,
                _prompt: &str,
                _options: &CompletionOptions,
            ) -> Result<String, CapabilityError> {
                Err(CapabilityError::Http("down".to_string()))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let aggregator = VerdictAggregator::new(Some(Arc::new(BrokenModel)));
        let result = aggregator
            .combine(
                "whole claim",
                vec![
                    sub("a", Verdict::Supported, "First reason.", &[]),
                    sub("b", Verdict::Supported, "Second reason.", &[]),
                ],
            )
            .await;

        assert_eq!(
            result.reasoning,
            "Sub-claim 1: First reason. Sub-claim 2: Second reason."
        );
        assert_eq!(result.verdict, Verdict::Supported);
    }

    #[tokio::test]
    async fn duplicate_citations_collapse_across_sub_results() {
        let aggregator = VerdictAggregator::new(None);
        let result = aggregator
            .combine(
                "whole claim",
                vec![
                    sub("a", Verdict::Supported, "r", &["https://a.com/1", "https://b.com/2"]),
                    sub("b", Verdict::Supported, "r", &["https://b.com/2", "https://c.com/3"]),
                ],
            )
            .await;

        let urls: Vec<&str> = result.citations.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/1", "https://b.com/2", "https://c.com/3"]);
    }
}
