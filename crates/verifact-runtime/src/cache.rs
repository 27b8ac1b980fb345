//! Completion caching.
//!
//! Identical prompts show up often in this workload: re-verifying a trending
//! claim repeats the same decomposition and stance prompts within minutes.
//! [`CachedLanguageModel`] wraps any model with an in-memory moka cache so
//! those repeats cost nothing.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::capabilities::{CapabilityError, CompletionOptions, LanguageModel};

/// Cache key over everything that affects a completion's content.
fn completion_key(prompt: &str, options: &CompletionOptions) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    options.max_tokens.hash(&mut hasher);
    options.temperature.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// Caching decorator for a [`LanguageModel`].
///
/// Only successful completions are cached; errors always retry the inner
/// model on the next call.
pub struct CachedLanguageModel {
    inner: Arc<dyn LanguageModel>,
    cache: Cache<u64, String>,
}

impl CachedLanguageModel {
    /// Wrap `inner` with a cache holding up to `capacity` completions, each
    /// expiring after `ttl`.
    pub fn new(inner: Arc<dyn LanguageModel>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Completions currently held.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop all cached completions.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl LanguageModel for CachedLanguageModel {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        let key = completion_key(prompt, options);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }
        let completion = self.inner.complete(prompt, options).await?;
        self.cache.insert(key, completion.clone()).await;
        Ok(completion)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
