//! Splitting a compound claim into independently checkable sub-claims.
//!
//! The language model proposes the split; when it is disabled, fails, or
//! returns nothing usable, a rule-based splitter takes over, and a claim
//! that resists both passes through whole.

use std::sync::Arc;

use verifact_core::config::DecomposeConfig;
use verifact_core::decompose::split_into_subclaims;
use verifact_core::{Claim, SubClaim};

use crate::capabilities::{CompletionOptions, LanguageModel};
use crate::{parse, prompts};

pub struct ClaimDecomposer {
    model: Option<Arc<dyn LanguageModel>>,
    config: DecomposeConfig,
}

impl ClaimDecomposer {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, config: DecomposeConfig) -> Self {
        Self { model, config }
    }

    /// Break `claim` into sub-claims. Never fails: every degradation path
    /// ends with the whole claim as a single sub-claim.
    pub async fn decompose(&self, claim: &Claim) -> Vec<SubClaim> {
        if !self.config.enabled || claim.char_len() < self.config.min_claim_length {
            return vec![SubClaim::new(0, claim.as_str())];
        }

        let mut parts = if self.config.use_llm {
            self.by_model(claim.as_str()).await
        } else {
            Vec::new()
        };
        if parts.len() <= 1 {
            parts = split_into_subclaims(claim.as_str(), self.config.max_subclaims);
        }
        if parts.len() <= 1 {
            return vec![SubClaim::new(0, claim.as_str())];
        }

        tracing::info!(count = parts.len(), "claim decomposed");
        parts
            .into_iter()
            .enumerate()
            .map(|(index, text)| SubClaim::new(index, text))
            .collect()
    }

    async fn by_model(&self, claim: &str) -> Vec<String> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let options = CompletionOptions {
            max_tokens: 1024,
            temperature: 0.0,
        };
        let response = match model.complete(&prompts::decompose_prompt(claim), &options).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "decomposition call failed");
                return Vec::new();
            }
        };
        match parse::json_string_array(&response) {
            Some(mut parts) => {
                parts.truncate(self.config.max_subclaims);
                parts
            }
            None => {
                tracing::debug!("decomposition response held no claim list");
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

    use crate::capabilities::CapabilityError;

    struct CannedModel {
        response: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(|_| CapabilityError::Http("canned failure".to_string()))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn config() -> DecomposeConfig {
        DecomposeConfig {
            enabled: true,
            use_llm: true,
            min_claim_length: 10,
            max_subclaims: 5,
        }
    }

    #[tokio::test]
    async fn short_claim_skips_the_model_entirely() {
        let model = Arc::new(CannedModel::ok(r#"["a", "b"]"#));
        let mut cfg = config();
        cfg.min_claim_length = 50;
        let decomposer = ClaimDecomposer::new(Some(model.clone()), cfg);
        let claim = Claim::new("Short claim.").unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].text, "Short claim.");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_split_is_capped_at_max_subclaims() {
        let model = Arc::new(CannedModel::ok(
            r#"["The Nile is in Africa", "The Nile is long", "The Nile floods yearly"]"#,
        ));
        let mut cfg = config();
        cfg.max_subclaims = 2;
        let decomposer = ClaimDecomposer::new(Some(model), cfg);
        let claim = Claim::new("The Nile is in Africa, is long, and floods yearly.").unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].index, 0);
        assert_eq!(subs[1].index, 1);
        assert_eq!(subs[0].text, "The Nile is in Africa");
    }

    #[tokio::test]
    async fn unparseable_model_output_falls_back_to_rules() {
        let model = Arc::new(CannedModel::ok("I cannot split this claim, sorry."));
        let decomposer = ClaimDecomposer::new(Some(model), config());
        let claim =
            Claim::new("The tower opened in 1889 and it remains the tallest structure in Paris.")
                .unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert!(subs.len() > 1, "rule splitter should find the conjunction");
    }

    #[tokio::test]
    async fn model_failure_on_unsplittable_claim_returns_whole() {
        let model = Arc::new(CannedModel::failing());
        let decomposer = ClaimDecomposer::new(Some(model), config());
        let claim = Claim::new("Water boils at one hundred degrees Celsius.").unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].text, claim.as_str());
    }

    #[tokio::test]
    async fn disabled_decomposition_passes_through() {
        let mut cfg = config();
        cfg.enabled = false;
        let decomposer = ClaimDecomposer::new(None, cfg);
        let claim =
            Claim::new("The tower opened in 1889 and it remains the tallest structure in Paris.")
                .unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn rules_only_mode_never_calls_the_model() {
        let model = Arc::new(CannedModel::ok(r#"["x", "y"]"#));
        let mut cfg = config();
        cfg.use_llm = false;
        let decomposer = ClaimDecomposer::new(Some(model.clone()), cfg);
        let claim =
            Claim::new("The tower opened in 1889 and it remains the tallest structure in Paris.")
                .unwrap();

        let subs = decomposer.decompose(&claim).await;
        assert!(subs.len() > 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
