//! Chroma vector store adapter over its REST API.
//!
//! Collections are addressed by name in configuration but by id on the
//! wire, so the adapter resolves names once and caches the mapping. A
//! refresh job may drop and recreate a collection under the same name; a
//! query against a stale id fails, the cached entry is evicted, and the
//! next call re-resolves.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use verifact_core::config::ProvidersConfig;
use verifact_core::{EvidenceItem, SourceKind};

use super::{http_client, transport_error, SNIPPET_CAP, TITLE_CAP};
use crate::capabilities::{CapabilityError, VectorKnowledgeStore};
use crate::prompts::truncate_chars;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Chroma-backed knowledge store.
#[derive(Debug)]
pub struct ChromaStore {
    base_url: String,
    collection_ids: RwLock<HashMap<String, String>>,
}

impl ChromaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection_ids: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(providers: &ProvidersConfig) -> Self {
        Self::new(&providers.chroma_base_url)
    }

    pub fn local() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Resolve a collection name to its id, consulting the cache first.
    async fn collection_id(&self, name: &str) -> Result<String, CapabilityError> {
        if let Some(id) = self.collection_ids.read().get(name) {
            return Ok(id.clone());
        }

        let response = http_client()
            .get(format!("{}/api/v1/collections/{name}", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: format!("collection '{name}' not available"),
            });
        }
        let body: CollectionInfo = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;

        self.collection_ids
            .write()
            .insert(name.to_string(), body.id.clone());
        Ok(body.id)
    }

    fn evict(&self, name: &str) {
        self.collection_ids.write().remove(name);
    }
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<DocumentMetadata>>>,
    #[serde(default)]
    distances: Vec<Vec<Option<f32>>>,
}

#[derive(Deserialize, Default, Clone)]
struct DocumentMetadata {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Convert Chroma's cosine distance (0 = identical, 2 = opposite) to a
/// descending similarity score in [0, 1].
fn distance_to_score(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorKnowledgeStore for ChromaStore {
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<EvidenceItem>, CapabilityError> {
        if embedding.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let id = self.collection_id(collection).await?;

        let payload = json!({
            "query_embeddings": [embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });
        let response = http_client()
            .post(format!("{}/api/v1/collections/{id}/query", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            // The id may be stale after a collection swap; force
            // re-resolution on the next call.
            self.evict(collection);
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: format!("query against collection '{collection}' failed"),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;

        let documents = body.documents.into_iter().next().unwrap_or_default();
        let metadatas = body.metadatas.into_iter().next().unwrap_or_default();
        let distances = body.distances.into_iter().next().unwrap_or_default();

        let mut items = Vec::with_capacity(documents.len());
        for (i, document) in documents.into_iter().enumerate() {
            let meta = metadatas
                .get(i)
                .cloned()
                .flatten()
                .unwrap_or_default();
            let url = meta.url.trim();
            if url.is_empty() {
                continue;
            }
            let snippet = match meta.snippet.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => document.unwrap_or_default(),
            };
            let score = distances
                .get(i)
                .copied()
                .flatten()
                .map(distance_to_score)
                .unwrap_or(0.0);
            let mut item = EvidenceItem::new(
                url,
                truncate_chars(meta.title.trim(), TITLE_CAP),
                truncate_chars(snippet.trim(), SNIPPET_CAP),
                SourceKind::KnowledgeBase,
            )
            .with_retrieval_score(score);
            if let Some(at) = meta
                .date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            {
                item = item.with_published_at(at.with_timezone(&Utc));
            }
            items.push(item);
        }
        tracing::debug!(
            collection,
            returned = items.len(),
            "knowledge store query completed"
        );
        Ok(items)
    }

    fn name(&self) -> &str {
        "chroma"
    }
}
