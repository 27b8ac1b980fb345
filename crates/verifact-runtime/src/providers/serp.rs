//! SerpApi adapter: Google results via the SerpApi gateway.
//!
//! Organic results carry no relevance score and frequently include listing
//! pages; the merger's homepage filter and the reranker's URL-quality term
//! compensate downstream.

use async_trait::async_trait;
use serde::Deserialize;
use verifact_core::config::ProvidersConfig;
use verifact_core::{EvidenceItem, SourceKind};

use super::factory::SearchProviderFactory;
use super::secrets::{ApiCredential, CredentialSource};
use super::{http_client, transport_error, SNIPPET_CAP, TITLE_CAP};
use crate::capabilities::{CapabilityError, WebSearchProvider};
use crate::prompts::truncate_chars;

/// Environment variable holding the SerpApi key.
pub const SERP_API_KEY_ENV: &str = "SERP_API_KEY";

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";

/// Results per request SerpApi accepts at most.
const MAX_RESULTS_PER_REQUEST: usize = 20;

/// SerpApi-backed web search.
pub struct SerpSearch {
    credential: ApiCredential,
    base_url: String,
}

impl std::fmt::Debug for SerpSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpSearch")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SerpSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "SerpApi key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load the key from `SERP_API_KEY`.
    pub fn from_env() -> Result<Self, CapabilityError> {
        let credential = ApiCredential::from_env(SERP_API_KEY_ENV, "SerpApi key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn from_config(providers: &ProvidersConfig) -> Result<Self, CapabilityError> {
        Ok(Self::from_env()?.with_base_url(&providers.serp_base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl WebSearchProvider for SerpSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceItem>, CapabilityError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let num = max_results.min(MAX_RESULTS_PER_REQUEST).to_string();
        let response = http_client()
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.credential.expose()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: format!("search request rejected ({status})"),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: error,
            });
        }

        let mut items = Vec::with_capacity(body.organic_results.len());
        for result in body.organic_results {
            let url = result.link.trim();
            if url.is_empty() {
                continue;
            }
            let title = result.title.trim();
            let title = if title.is_empty() { "No title" } else { title };
            let snippet = result
                .snippet
                .as_deref()
                .or(result.description.as_deref())
                .unwrap_or("")
                .trim();
            items.push(EvidenceItem::new(
                url,
                truncate_chars(title, TITLE_CAP),
                truncate_chars(snippet, SNIPPET_CAP),
                SourceKind::Search,
            ));
        }
        tracing::debug!(
            query = truncate_chars(query, 50),
            returned = items.len(),
            "serp search completed"
        );
        Ok(items)
    }

    fn name(&self) -> &str {
        "serp"
    }
}

/// Registry factory for [`SerpSearch`].
pub struct SerpSearchFactory;

impl SearchProviderFactory for SerpSearchFactory {
    fn provider_type(&self) -> &'static str {
        "serp"
    }

    fn create(
        &self,
        providers: &ProvidersConfig,
    ) -> Result<std::sync::Arc<dyn WebSearchProvider>, CapabilityError> {
        Ok(std::sync::Arc::new(SerpSearch::from_config(providers)?))
    }

    fn description(&self) -> &'static str {
        "SerpApi Google search (broad coverage, no relevance scores)"
    }
}
