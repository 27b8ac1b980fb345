//! Pipeline configuration.
//!
//! One immutable [`VerifierConfig`] carries every tunable and is handed
//! to the runtime at construction; nothing reads the environment ad hoc
//! after startup. Values layer as defaults → optional YAML file →
//! environment overrides.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Loop control, timeouts, and verdict thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Agentic-loop iteration budget.
    pub max_iterations: usize,

    /// Upper bound for each external capability call.
    #[serde(with = "duration_format")]
    pub call_timeout: Duration,

    /// Evidence floor for sufficiency and for Supported/Refuted citations.
    pub min_sources_for_verdict: usize,

    /// Conflict tunable: `None` treats any support/refute overlap as a
    /// conflict; `Some(r)` calls the state one-sided when the majority
    /// stance has at least `r` times the minority's count.
    pub conflict_disparity_ratio: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            call_timeout: Duration::from_secs(20),
            min_sources_for_verdict: 1,
            conflict_disparity_ratio: None,
        }
    }
}

/// Evidence gathering: targets, refinement schedule, collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Per-source evidence target on the first iteration.
    pub initial_top_k: usize,

    /// Added to `top_k` on each refinement.
    pub refine_top_k_step: usize,

    /// `top_k` never grows past this.
    pub refine_top_k_ceiling: usize,

    /// From this iteration on, the knowledge store queries only the
    /// recent collection (0-based).
    pub recent_only_after_iteration: usize,

    /// Web results requested per planned query variant.
    pub results_per_query: usize,

    /// Frequently refreshed knowledge-base collection.
    pub recent_collection: String,

    /// Static knowledge-base collection.
    pub archive_collection: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            initial_top_k: 10,
            refine_top_k_step: 5,
            refine_top_k_ceiling: 20,
            recent_only_after_iteration: 1,
            results_per_query: 5,
            recent_collection: "current_affairs_24h".to_string(),
            archive_collection: "static_gk".to_string(),
        }
    }
}

/// Claim decomposition knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeConfig {
    pub enabled: bool,

    /// Use the language model; when false, only the rule-based splitter.
    pub use_llm: bool,

    /// Claims shorter than this skip decomposition entirely.
    pub min_claim_length: usize,

    pub max_subclaims: usize,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_llm: true,
            min_claim_length: 40,
            max_subclaims: 4,
        }
    }
}

/// Reranker knobs (weights are fixed, see `rerank`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub top_n: usize,
    pub per_domain_cap: usize,
    pub ambiguous_quality: f32,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            top_n: 8,
            per_domain_cap: 2,
            ambiguous_quality: 0.5,
        }
    }
}

/// Stance evaluation knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Snippets per stance-classification call.
    pub stance_batch_size: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            stance_batch_size: 30,
        }
    }
}

/// Citation credibility filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityConfig {
    /// Domain allowlist (without `www.`). Empty disables the filter.
    pub credible_domains: HashSet<String>,
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        Self {
            credible_domains: default_credible_domains(),
        }
    }
}

/// Language-model response cache (opt-in).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: u64,
    #[serde(with = "duration_format")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 1024,
            ttl: Duration::from_secs(600),
        }
    }
}

/// Provider selection and endpoints. API keys never live here; adapters
/// read them from the environment at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub llm_model: String,
    pub embedding_model: String,

    /// Registered name of the web-search backend ("tavily", "serp").
    pub search_provider: String,

    pub openai_base_url: String,
    pub tavily_base_url: String,
    pub serp_base_url: String,
    pub chroma_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            llm_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            search_provider: "tavily".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            tavily_base_url: "https://api.tavily.com".to_string(),
            serp_base_url: "https://serpapi.com/search".to_string(),
            chroma_base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// The one immutable configuration value for a verification pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub pipeline: PipelineConfig,
    pub retrieval: RetrievalConfig,
    pub decompose: DecomposeConfig,
    pub rerank: RerankConfig,
    pub evaluation: EvaluationConfig,
    pub credibility: CredibilityConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
}

impl VerifierConfig {
    /// Parse configuration from a YAML string and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: VerifierConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file and validate it.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Full layering: defaults, then the YAML file when given, then
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let contents = fs::read_to_string(p)?;
                serde_yaml::from_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides in place.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        set_parsed(&mut self.pipeline.max_iterations, "AGENTIC_LOOP_MAX_ITER")?;
        set_duration(&mut self.pipeline.call_timeout, "LLM_CALL_TIMEOUT")?;
        set_parsed(
            &mut self.pipeline.min_sources_for_verdict,
            "MIN_SOURCES_FOR_VERDICT",
        )?;
        if let Some(ratio) = parse_env::<f32>("CONFLICT_DISPARITY_RATIO")? {
            self.pipeline.conflict_disparity_ratio = Some(ratio);
        }

        set_parsed(&mut self.retrieval.initial_top_k, "RAG_TOP_K")?;
        set_parsed(&mut self.retrieval.refine_top_k_step, "REFINE_TOP_K_STEP")?;
        set_parsed(
            &mut self.retrieval.refine_top_k_ceiling,
            "REFINE_TOP_K_CEILING",
        )?;
        set_parsed(
            &mut self.retrieval.recent_only_after_iteration,
            "RECENT_ONLY_AFTER_ITERATION",
        )?;
        set_parsed(&mut self.retrieval.results_per_query, "RESULTS_PER_QUERY")?;

        set_bool(&mut self.decompose.enabled, "DECOMPOSE_ENABLED")?;
        set_bool(&mut self.decompose.use_llm, "DECOMPOSE_USE_LLM")?;
        set_parsed(
            &mut self.decompose.min_claim_length,
            "DECOMPOSE_MIN_CLAIM_LENGTH",
        )?;
        set_parsed(&mut self.decompose.max_subclaims, "DECOMPOSE_MAX_SUBCLAIMS")?;

        set_parsed(&mut self.rerank.top_n, "RERANK_TOP_K")?;
        set_parsed(&mut self.rerank.per_domain_cap, "RERANK_PER_DOMAIN_CAP")?;

        set_parsed(&mut self.evaluation.stance_batch_size, "STANCE_BATCH_SIZE")?;

        if let Some(raw) = env_nonempty("CREDIBLE_DOMAINS") {
            self.credibility.credible_domains = raw
                .split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
        }

        set_bool(&mut self.cache.enabled, "CACHE_ENABLED")?;
        set_parsed(&mut self.cache.capacity, "CACHE_CAPACITY")?;
        set_duration(&mut self.cache.ttl, "CACHE_TTL")?;

        set_string(&mut self.providers.llm_model, "OPENAI_LLM_MODEL");
        set_string(&mut self.providers.embedding_model, "OPENAI_EMBEDDING_MODEL");
        set_string(&mut self.providers.search_provider, "SEARCH_PROVIDER");
        set_string(&mut self.providers.openai_base_url, "OPENAI_BASE_URL");
        set_string(&mut self.providers.tavily_base_url, "TAVILY_BASE_URL");
        set_string(&mut self.providers.serp_base_url, "SERP_API_BASE_URL");
        set_string(&mut self.providers.chroma_base_url, "CHROMA_BASE_URL");

        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_iterations == 0 {
            return Err(invalid("pipeline.max_iterations", "must be at least 1"));
        }
        if self.pipeline.call_timeout.is_zero() {
            return Err(invalid("pipeline.call_timeout", "must be positive"));
        }
        if self.pipeline.min_sources_for_verdict == 0 {
            return Err(invalid(
                "pipeline.min_sources_for_verdict",
                "must be at least 1",
            ));
        }
        if let Some(ratio) = self.pipeline.conflict_disparity_ratio {
            if !ratio.is_finite() || ratio <= 1.0 {
                return Err(invalid(
                    "pipeline.conflict_disparity_ratio",
                    "must be greater than 1.0",
                ));
            }
        }
        if self.retrieval.initial_top_k == 0 {
            return Err(invalid("retrieval.initial_top_k", "must be at least 1"));
        }
        if self.retrieval.refine_top_k_ceiling < self.retrieval.initial_top_k {
            return Err(invalid(
                "retrieval.refine_top_k_ceiling",
                "must not be below retrieval.initial_top_k",
            ));
        }
        if self.retrieval.results_per_query == 0 {
            return Err(invalid("retrieval.results_per_query", "must be at least 1"));
        }
        if self.retrieval.recent_collection.is_empty()
            || self.retrieval.archive_collection.is_empty()
        {
            return Err(invalid("retrieval collections", "must not be empty"));
        }
        if self.decompose.max_subclaims == 0 {
            return Err(invalid("decompose.max_subclaims", "must be at least 1"));
        }
        if self.rerank.top_n == 0 {
            return Err(invalid("rerank.top_n", "must be at least 1"));
        }
        if self.rerank.per_domain_cap == 0 {
            return Err(invalid("rerank.per_domain_cap", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.rerank.ambiguous_quality) {
            return Err(invalid("rerank.ambiguous_quality", "must be in [0, 1]"));
        }
        if self.evaluation.stance_batch_size == 0 {
            return Err(invalid("evaluation.stance_batch_size", "must be at least 1"));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(invalid("cache.capacity", "must be at least 1 when enabled"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation(format!("{field}: {reason}"))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_nonempty(key) {
        None => Ok(None),
        Some(raw) => match raw.parse() {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                reason: e.to_string(),
            }),
        },
    }
}

fn set_parsed<T: FromStr>(target: &mut T, key: &str) -> Result<(), ConfigError>
where
    T::Err: std::fmt::Display,
{
    if let Some(value) = parse_env(key)? {
        *target = value;
    }
    Ok(())
}

fn set_string(target: &mut String, key: &str) {
    if let Some(value) = env_nonempty(key) {
        *target = value;
    }
}

fn set_bool(target: &mut bool, key: &str) -> Result<(), ConfigError> {
    let Some(raw) = env_nonempty(key) else {
        return Ok(());
    };
    *target = match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            })
        }
    };
    Ok(())
}

fn set_duration(target: &mut Duration, key: &str) -> Result<(), ConfigError> {
    let Some(raw) = env_nonempty(key) else {
        return Ok(());
    };
    match humantime::parse_duration(&raw) {
        Ok(value) => {
            *target = value;
            Ok(())
        }
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn default_credible_domains() -> HashSet<String> {
    [
        "reuters.com",
        "apnews.com",
        "afp.com",
        "bbc.com",
        "bbc.co.uk",
        "npr.org",
        "nytimes.com",
        "washingtonpost.com",
        "theguardian.com",
        "wsj.com",
        "ft.com",
        "economist.com",
        "aljazeera.com",
        "cnn.com",
        "nbcnews.com",
        "cbsnews.com",
        "abcnews.go.com",
        "snopes.com",
        "politifact.com",
        "factcheck.org",
        "fullfact.org",
        "who.int",
        "cdc.gov",
        "nasa.gov",
        "nature.com",
        "science.org",
        "scientificamerican.com",
        "britannica.com",
        "wikipedia.org",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Serialize durations as humantime strings ("20s", "10m").
mod duration_format {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
