//! Knowledge-base evidence gathering: embed the claim once, then query the
//! refreshed "recent" collection and optionally the static archive.

use std::collections::HashSet;
use std::sync::Arc;

use crate::capabilities::{Embedder, VectorKnowledgeStore};
use verifact_core::config::RetrievalConfig;
use verifact_core::EvidenceItem;

/// Gathers stored evidence for one claim via embedding lookup.
pub struct KnowledgeAgent {
    store: Arc<dyn VectorKnowledgeStore>,
    embedder: Arc<dyn Embedder>,
    recent_collection: String,
    archive_collection: String,
}

impl KnowledgeAgent {
    pub fn new(
        store: Arc<dyn VectorKnowledgeStore>,
        embedder: Arc<dyn Embedder>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            recent_collection: retrieval.recent_collection.clone(),
            archive_collection: retrieval.archive_collection.clone(),
        }
    }

    /// Query up to `top_k` documents per collection, deduplicated by raw
    /// URL with the recent collection taking precedence.
    ///
    /// `recent_only` restricts retrieval to the frequently-refreshed
    /// collection; later loop iterations use it to bias toward current
    /// coverage. Embedding failure or a failed collection degrades to an
    /// empty contribution.
    pub async fn gather(&self, claim: &str, top_k: usize, recent_only: bool) -> Vec<EvidenceItem> {
        if claim.trim().is_empty() {
            return Vec::new();
        }
        let embedding = match self.embedder.embed(claim).await {
            Ok(embedding) if !embedding.is_empty() => embedding,
            Ok(_) => {
                tracing::warn!("embedder returned an empty vector");
                return Vec::new();
            }
            Err(error) => {
                tracing::warn!(error = %error, "claim embedding failed");
                return Vec::new();
            }
        };

        let mut collections = vec![self.recent_collection.as_str()];
        if !recent_only {
            collections.push(self.archive_collection.as_str());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut items: Vec<EvidenceItem> = Vec::new();
        for collection in collections {
            match self.store.query(collection, &embedding, top_k).await {
                Ok(batch) => {
                    for item in batch {
                        let url = item.url.trim();
                        if url.is_empty() || seen.contains(url) {
                            continue;
                        }
                        seen.insert(url.to_string());
                        items.push(item);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        store = self.store.name(),
                        collection,
                        error = %error,
                        "knowledge collection query failed"
                    );
                }
            }
        }
        items
    }
}
