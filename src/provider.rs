//! Model backends: the two opaque capabilities the pipeline consumes.
//!
//! The pipeline never talks to a vendor API directly. It sees:
//!
//! * [`TextModel`]: `complete(prompt) -> text`
//! * [`ImageModel`]: `synthesize(prompt) -> image reference` (URL or
//!   `data:` URI)
//!
//! [`LlmTextModel`] adapts any `edgequake_llm` provider (OpenAI, Anthropic,
//! Gemini, Ollama, Azure, ...). [`HttpImageModel`] calls an
//! OpenAI-compatible `/v1/images/generations` endpoint. Tests and embedders
//! plug in their own implementations through
//! [`crate::config::PipelineConfigBuilder::text_model`] and
//! [`crate::config::PipelineConfigBuilder::image_model`].

use crate::config::PipelineConfig;
use crate::error::{ContentGenError, ModelError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Default text model when a provider is named without one.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4.1-mini";

/// Text completion capability.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Complete `prompt` and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Image synthesis capability.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Synthesise one image for `prompt`; returns a URL or `data:` URI.
    async fn synthesize(&self, prompt: &str) -> Result<String, ModelError>;
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`TextModel`] backed by an `edgequake_llm` provider.
pub struct LlmTextModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmTextModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextModel for LlmTextModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = self.options();
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Api(format!("{e}")))?;
        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

// ── HTTP image adapter ───────────────────────────────────────────────────

/// [`ImageModel`] for OpenAI-compatible image generation endpoints.
///
/// Responses carrying `url` are passed through; responses carrying
/// `b64_json` become `data:image/png;base64,...` URIs.
pub struct HttpImageModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

impl HttpImageModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            size: size.into(),
        }
    }
}

#[async_trait]
impl ImageModel for HttpImageModel {
    async fn synthesize(&self, prompt: &str) -> Result<String, ModelError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("HTTP {status}: {}", text.trim())));
        }

        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let datum = parsed.data.into_iter().next().ok_or(ModelError::EmptyResponse)?;
        image_reference(datum)
    }
}

fn image_reference(datum: ImageDatum) -> Result<String, ModelError> {
    if let Some(url) = datum.url.filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }
    match datum.b64_json {
        Some(b64) if !b64.trim().is_empty() => {
            let bytes = STANDARD
                .decode(b64.trim())
                .map_err(|e| ModelError::Malformed(format!("invalid base64 image: {e}")))?;
            if bytes.is_empty() {
                return Err(ModelError::EmptyResponse);
            }
            Ok(format!("data:image/png;base64,{}", b64.trim()))
        }
        _ => Err(ModelError::EmptyResponse),
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Resolve the text model, from most-specific to least-specific:
///
/// 1. **Pre-built model** (`config.text_model`)
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI key present** (`OPENAI_API_KEY`)
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
pub fn resolve_text_model(config: &PipelineConfig) -> Result<Arc<dyn TextModel>, ContentGenError> {
    if let Some(ref model) = config.text_model {
        return Ok(Arc::clone(model));
    }

    let provider = resolve_llm_provider(config)?;
    Ok(Arc::new(LlmTextModel::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}

/// Resolve the image model: a pre-built model, or the HTTP adapter keyed
/// by `config.image_api_key` / `OPENAI_API_KEY`.
pub fn resolve_image_model(
    config: &PipelineConfig,
) -> Result<Arc<dyn ImageModel>, ContentGenError> {
    if let Some(ref model) = config.image_model {
        return Ok(Arc::clone(model));
    }

    let key = config
        .image_api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
        .ok_or_else(|| ContentGenError::ProviderNotConfigured {
            provider: "images".to_string(),
            hint: "Image synthesis needs an API key.\n\
                   Set OPENAI_API_KEY, pass --image-api-key, or request 0 images."
                .to_string(),
        })?;

    Ok(Arc::new(HttpImageModel::new(
        config.image_endpoint.clone(),
        config.image_model_name.clone(),
        key,
        config.image_size.clone(),
    )))
}

fn resolve_llm_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, ContentGenError> {
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ContentGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ContentGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ContentGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
