//! Usage accounting for external-capability calls.
//!
//! Providers bill per call and per token, so the pipeline keeps a running
//! tally of what one verification consumed. Counters are recorded
//! opportunistically and never influence control flow.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::capabilities::{CapabilityError, CompletionOptions, LanguageModel};

/// Point-in-time copy of the counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Completed language-model calls (successful or not).
    pub llm_calls: u64,
    /// Token estimate for prompts sent to the model.
    pub estimated_prompt_tokens: u64,
    /// Token estimate for text received from the model.
    pub estimated_completion_tokens: u64,
    /// Web-search gather rounds issued.
    pub search_calls: u64,
    /// Evidence items returned by web search.
    pub search_results: u64,
    /// Knowledge-store gather rounds issued.
    pub knowledge_queries: u64,
    /// Evidence items returned by the knowledge store.
    pub knowledge_results: u64,
}

impl UsageSnapshot {
    /// Combined token estimate across prompts and completions.
    pub fn estimated_total_tokens(&self) -> u64 {
        self.estimated_prompt_tokens + self.estimated_completion_tokens
    }

    /// Estimated spend in USD for the recorded model calls.
    ///
    /// Unknown model names assume the default model's rates.
    pub fn estimated_cost_usd(&self, model: &str) -> f64 {
        // Pricing per million tokens (as of mid 2026)
        let (input_rate, output_rate) = match model {
            m if m.contains("gpt-4o-mini") => (0.15, 0.6),
            m if m.contains("gpt-4o") => (2.5, 10.0),
            m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
            m if m.contains("gpt-4.1") => (2.0, 8.0),
            _ => (0.15, 0.6),
        };

        let input_cost = (self.estimated_prompt_tokens as f64 / 1_000_000.0) * input_rate;
        let output_cost = (self.estimated_completion_tokens as f64 / 1_000_000.0) * output_rate;
        input_cost + output_cost
    }
}

/// Rough chars-to-tokens conversion; close enough for budget telemetry.
fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4) as u64
}

/// Thread-safe usage counters shared across pipeline components.
#[derive(Debug, Default)]
pub struct UsageTracker {
    inner: RwLock<UsageSnapshot>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_llm_call(&self, prompt: &str, completion: &str) {
        let mut inner = self.inner.write();
        inner.llm_calls += 1;
        inner.estimated_prompt_tokens += estimate_tokens(prompt);
        inner.estimated_completion_tokens += estimate_tokens(completion);
    }

    pub fn record_search(&self, results: usize) {
        let mut inner = self.inner.write();
        inner.search_calls += 1;
        inner.search_results += results as u64;
    }

    pub fn record_knowledge_query(&self, results: usize) {
        let mut inner = self.inner.write();
        inner.knowledge_queries += 1;
        inner.knowledge_results += results as u64;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.inner.read().clone()
    }

    pub fn reset(&self) {
        *self.inner.write() = UsageSnapshot::default();
    }
}

/// Decorator that counts every completion against a [`UsageTracker`].
///
/// Failed calls are counted too; a timeout still consumed provider quota.
pub struct TrackedLanguageModel {
    inner: Arc<dyn LanguageModel>,
    tracker: Arc<UsageTracker>,
}

impl TrackedLanguageModel {
    pub fn new(inner: Arc<dyn LanguageModel>, tracker: Arc<UsageTracker>) -> Self {
        Self { inner, tracker }
    }
}

#[async_trait]
impl LanguageModel for TrackedLanguageModel {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        let result = self.inner.complete(prompt, options).await;
        let completion = result.as_deref().unwrap_or("");
        self.tracker.record_llm_call(prompt, completion);
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel;

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            Ok("12345678".to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn counters_accumulate() {
        let tracker = UsageTracker::new();
        tracker.record_search(5);
        tracker.record_search(3);
        tracker.record_knowledge_query(10);

        let snap = tracker.snapshot();
        assert_eq!(snap.search_calls, 2);
        assert_eq!(snap.search_results, 8);
        assert_eq!(snap.knowledge_queries, 1);
        assert_eq!(snap.knowledge_results, 10);
    }

    #[test]
    fn reset_zeroes_everything() {
        let tracker = UsageTracker::new();
        tracker.record_search(5);
        tracker.reset();
        assert_eq!(tracker.snapshot(), UsageSnapshot::default());
    }

    #[tokio::test]
    async fn tracked_model_records_calls_and_tokens() {
        let tracker = Arc::new(UsageTracker::new());
        let model = TrackedLanguageModel::new(Arc::new(FixedModel), Arc::clone(&tracker));

        let reply = model
            .complete("sixteen chars ok", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "12345678");

        let snap = tracker.snapshot();
        assert_eq!(snap.llm_calls, 1);
        assert_eq!(snap.estimated_prompt_tokens, 4);
        assert_eq!(snap.estimated_completion_tokens, 2);
        assert_eq!(snap.estimated_total_tokens(), 6);
    }

    #[test]
    fn cost_estimate_follows_model_rates() {
        let snap = UsageSnapshot {
            estimated_prompt_tokens: 1_000_000,
            estimated_completion_tokens: 500_000,
            ..UsageSnapshot::default()
        };

        // 1M input at $0.15/MTok + 0.5M output at $0.6/MTok = $0.45
        let mini = snap.estimated_cost_usd("gpt-4o-mini");
        assert!((mini - 0.45).abs() < 1e-9);

        // The mini variant must not fall through to full gpt-4o rates.
        let full = snap.estimated_cost_usd("gpt-4o");
        assert!(full > mini);

        // Unknown models get the default rates.
        assert!((snap.estimated_cost_usd("custom-local") - mini).abs() < 1e-9);
    }
}
