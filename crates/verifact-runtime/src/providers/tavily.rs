//! Tavily search adapter.
//!
//! Tavily is tuned for retrieval-augmented workloads and returns
//! article-specific URLs with per-result relevance scores, which feed the
//! reranker's composite score directly.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use verifact_core::config::ProvidersConfig;
use verifact_core::{EvidenceItem, SourceKind};

use super::factory::SearchProviderFactory;
use super::secrets::{ApiCredential, CredentialSource};
use super::{http_client, transport_error, SNIPPET_CAP, TITLE_CAP};
use crate::capabilities::{CapabilityError, WebSearchProvider};
use crate::prompts::truncate_chars;

/// Environment variable holding the Tavily API key.
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Results per request Tavily accepts at most.
const MAX_RESULTS_PER_REQUEST: usize = 20;

/// Tavily-backed web search.
pub struct TavilySearch {
    credential: ApiCredential,
    base_url: String,
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Tavily API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load the key from `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self, CapabilityError> {
        let credential = ApiCredential::from_env(TAVILY_API_KEY_ENV, "Tavily API key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn from_config(providers: &ProvidersConfig) -> Result<Self, CapabilityError> {
        Ok(Self::from_env()?.with_base_url(&providers.tavily_base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    /// Tavily ships the article snippet in `content`.
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    published_date: Option<String>,
}

/// Parse Tavily's published date, which is RFC 3339 or a bare `YYYY-MM-DD`.
fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl WebSearchProvider for TavilySearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceItem>, CapabilityError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let request = SearchRequest {
            api_key: self.credential.expose(),
            query,
            search_depth: "basic",
            include_answer: false,
            include_raw_content: false,
            max_results: max_results.min(MAX_RESULTS_PER_REQUEST),
        };

        let response = http_client()
            .post(format!("{}/search", self.base_url))
            .json(&request)
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

        let mut items = Vec::with_capacity(body.results.len());
        for result in body.results {
            let url = result.url.trim();
            if url.is_empty() {
                continue;
            }
            let title = result.title.trim();
            let title = if title.is_empty() { "No title" } else { title };
            let mut item = EvidenceItem::new(
                url,
                truncate_chars(title, TITLE_CAP),
                truncate_chars(result.content.trim(), SNIPPET_CAP),
                SourceKind::Search,
            );
            if let Some(score) = result.score {
                item = item.with_retrieval_score(score);
            }
            if let Some(at) = result.published_date.as_deref().and_then(parse_published) {
                item = item.with_published_at(at);
            }
            items.push(item);
        }
        tracing::debug!(
            query = truncate_chars(query, 50),
            returned = items.len(),
            "tavily search completed"
        );
        Ok(items)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

/// Registry factory for [`TavilySearch`].
pub struct TavilySearchFactory;

impl SearchProviderFactory for TavilySearchFactory {
    fn provider_type(&self) -> &'static str {
        "tavily"
    }

    fn create(
        &self,
        providers: &ProvidersConfig,
    ) -> Result<std::sync::Arc<dyn WebSearchProvider>, CapabilityError> {
        Ok(std::sync::Arc::new(TavilySearch::from_config(providers)?))
    }

    fn description(&self) -> &'static str {
        "Tavily search API (article-specific URLs, relevance scores)"
    }
}
