//! Concrete capability implementations behind feature flags.
//!
//! Each adapter is a thin HTTP shim that maps one vendor's wire format onto
//! the capability traits in [`crate::capabilities`]. Keys are loaded from
//! the environment via [`secrets::ApiCredential`] and never logged.
//!
//! | Feature  | Adapter | Capability |
//! |----------|---------|------------|
//! | `openai` | [`openai::OpenAiProvider`] | [`LanguageModel`](crate::capabilities::LanguageModel) + [`Embedder`](crate::capabilities::Embedder) |
//! | `tavily` | [`tavily::TavilySearch`] | [`WebSearchProvider`](crate::capabilities::WebSearchProvider) |
//! | `serp`   | [`serp::SerpSearch`] | [`WebSearchProvider`](crate::capabilities::WebSearchProvider) |
//! | `chroma` | [`chroma::ChromaStore`] | [`VectorKnowledgeStore`](crate::capabilities::VectorKnowledgeStore) |

pub mod factory;
pub mod secrets;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "tavily")]
pub mod tavily;

#[cfg(feature = "serp")]
pub mod serp;

#[cfg(feature = "chroma")]
pub mod chroma;

pub use factory::{SearchProviderFactory, SearchProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

#[cfg(feature = "tavily")]
pub use tavily::TavilySearch;

#[cfg(feature = "serp")]
pub use serp::SerpSearch;

#[cfg(feature = "chroma")]
pub use chroma::ChromaStore;

/// Hard ceiling on any single provider request; the orchestrator applies
/// its own (usually tighter) per-call deadline on top.
#[cfg(any(
    feature = "openai",
    feature = "tavily",
    feature = "serp",
    feature = "chroma"
))]
pub(crate) const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Longest title stored per evidence item.
#[cfg(any(feature = "tavily", feature = "serp", feature = "chroma"))]
pub(crate) const TITLE_CAP: usize = 500;

/// Longest snippet stored per evidence item.
#[cfg(any(feature = "tavily", feature = "serp", feature = "chroma"))]
pub(crate) const SNIPPET_CAP: usize = 1000;

/// Process-wide HTTP client shared by all adapters.
#[cfg(any(
    feature = "openai",
    feature = "tavily",
    feature = "serp",
    feature = "chroma"
))]
pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("failed to build HTTP client")
    })
}

/// Map a reqwest failure onto a capability error.
#[cfg(any(
    feature = "openai",
    feature = "tavily",
    feature = "serp",
    feature = "chroma"
))]
pub(crate) fn transport_error(err: reqwest::Error) -> crate::capabilities::CapabilityError {
    use crate::capabilities::CapabilityError;
    if err.is_timeout() {
        CapabilityError::Timeout(HTTP_TIMEOUT)
    } else {
        CapabilityError::Http(err.to_string())
    }
}
