//! Built-in lexical relevance scorer.
//!
//! Used when no model-backed scorer is wired in. Scores by content-word
//! overlap between the claim and a snippet, which is coarse but deterministic
//! and keeps reranking meaningful without any network dependency.

use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::capabilities::{CapabilityError, RelevanceScorer};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[a-z0-9]+").unwrap();
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "did", "do", "does",
        "for", "from", "had", "has", "have", "he", "her", "his", "in", "is", "it", "its", "nor",
        "not", "of", "on", "or", "she", "that", "the", "their", "them", "they", "this", "to",
        "was", "were", "which", "who", "will", "with",
    ]
    .into_iter()
    .collect();
}

/// Unique lowercase content words of `text`, minus stopwords and one-letter
/// tokens.
fn content_words(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Relevance by fraction of the claim's content words present in the snippet.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalRelevance;

impl LexicalRelevance {
    pub fn new() -> Self {
        Self
    }

    fn overlap(claim: &str, snippet: &str) -> f32 {
        let claim_words = content_words(claim);
        if claim_words.is_empty() {
            return 0.0;
        }
        let snippet_words = content_words(snippet);
        let shared = claim_words.intersection(&snippet_words).count();
        (shared as f32 / claim_words.len() as f32).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl RelevanceScorer for LexicalRelevance {
    async fn score(&self, claim: &str, snippet: &str) -> Result<f32, CapabilityError> {
        Ok(Self::overlap(claim, snippet))
    }
}
