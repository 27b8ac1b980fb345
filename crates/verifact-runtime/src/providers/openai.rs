//! OpenAI adapter: chat completions for text generation and the embeddings
//! endpoint for knowledge-store queries.
//!
//! The API key is held in an [`ApiCredential`] and exposed only when the
//! Authorization header is written.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use verifact_core::config::ProvidersConfig;

use super::secrets::{ApiCredential, CredentialSource};
use super::{http_client, transport_error};
use crate::capabilities::{
    CapabilityError, CompletionOptions, Embedder, LanguageModel,
};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI-backed language model and embedder.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    llm_model: String,
    embedding_model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("llm_model", &self.llm_model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider with an explicit key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "OpenAI API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Load the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, CapabilityError> {
        let credential = ApiCredential::from_env(OPENAI_API_KEY_ENV, "OpenAI API key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    /// Load the key from the environment and take models and base URL from
    /// provider configuration.
    pub fn from_config(providers: &ProvidersConfig) -> Result<Self, CapabilityError> {
        let provider = Self::from_env()?
            .with_base_url(&providers.openai_base_url)
            .with_llm_model(&providers.llm_model)
            .with_embedding_model(&providers.embedding_model);
        Ok(provider)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    async fn error_for_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CapabilityError> {
        let status = response.status();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            return Err(CapabilityError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LanguageModel for OpenAiProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        let request = ChatRequest {
            model: &self.llm_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::error_for_status(response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Parse("no choices in completion".to_string()))?
            .message
            .content
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: vec![text],
        };

        let response = http_client()
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::error_for_status(response).await?;

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;
        body.data
            .into_iter()
            .find(|datum| datum.index == 0)
            .map(|datum| datum.embedding)
            .ok_or_else(|| CapabilityError::Parse("no embedding in response".to_string()))
    }
}
