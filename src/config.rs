//! Configuration types for content generation.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built
//! via its [`PipelineConfigBuilder`]. Request bounds (word counts, image
//! counts, field lengths, the tone list) live in [`GenerationLimits`] rather
//! than in code: different deployments disagree on them (2000 vs 3000 words,
//! 3 vs 5 images) and should not need a rebuild to change them.

use crate::error::ContentGenError;
use crate::progress::ProgressCallback;
use crate::provider::{ImageModel, TextModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Tone used when a request does not name one.
pub const DEFAULT_TONE: &str = "friendly and helpful";

/// Default fallback image reference. `{index}` is replaced by the 1-based
/// image slot.
pub const DEFAULT_FALLBACK_IMAGE_TEMPLATE: &str =
    "https://placehold.co/800x450/png?text=Image+{index}";

/// Default OpenAI-compatible image generation endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

/// Configuration for a generation pipeline.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_contentgen::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.8)
///     .image_concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Pre-constructed text model. Takes precedence over `provider_name`.
    pub text_model: Option<Arc<dyn TextModel>>,

    /// Pre-constructed image model. Takes precedence over the HTTP settings.
    pub image_model: Option<Arc<dyn ImageModel>>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `text_model`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses the default.
    pub model: Option<String>,

    /// Image generation endpoint (OpenAI images API shape).
    pub image_endpoint: String,

    /// Image model name sent to `image_endpoint`. Default: "gpt-image-1".
    pub image_model_name: String,

    /// API key for `image_endpoint`. Falls back to `OPENAI_API_KEY`.
    pub image_api_key: Option<String>,

    /// Requested image size, e.g. "1024x1024".
    pub image_size: String,

    /// Sampling temperature for text completions. Default: 0.7.
    ///
    /// Marketing copy benefits from some variety; transcription-style
    /// tasks would want this near zero.
    pub temperature: f32,

    /// Maximum tokens per text completion. Default: 4096.
    ///
    /// A 3000-word post is roughly 4000 tokens; going lower truncates long
    /// posts mid-sentence.
    pub max_tokens: usize,

    /// Request bounds and the accepted tone list.
    pub limits: GenerationLimits,

    /// Characters of surrounding text (each side) used as image context. Default: 150.
    pub context_radius: usize,

    /// Image slots synthesised concurrently within one request. Default: 1.
    ///
    /// Results are always ordered by placeholder index regardless of this
    /// value; raise it only if the image backend tolerates concurrent calls
    /// from one caller.
    pub image_concurrency: usize,

    /// Social posts generated concurrently within one batch. Default: 3.
    pub post_concurrency: usize,

    /// Fallback image reference template; must contain `{index}`.
    pub fallback_image_template: String,

    /// Receives stage and image events while a request runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_model: None,
            image_model: None,
            provider_name: None,
            model: None,
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            image_model_name: "gpt-image-1".to_string(),
            image_api_key: None,
            image_size: "1024x1024".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            limits: GenerationLimits::default(),
            context_radius: 150,
            image_concurrency: 1,
            post_concurrency: 3,
            fallback_image_template: DEFAULT_FALLBACK_IMAGE_TEMPLATE.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("text_model", &self.text_model.as_ref().map(|_| "<dyn TextModel>"))
            .field("image_model", &self.image_model.as_ref().map(|_| "<dyn ImageModel>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("image_endpoint", &self.image_endpoint)
            .field("image_model_name", &self.image_model_name)
            .field("image_api_key", &self.image_api_key.as_ref().map(|_| "<redacted>"))
            .field("image_size", &self.image_size)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("limits", &self.limits)
            .field("context_radius", &self.context_radius)
            .field("image_concurrency", &self.image_concurrency)
            .field("post_concurrency", &self.post_concurrency)
            .field("fallback_image_template", &self.fallback_image_template)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The fallback reference for image slot `index` (1-based).
    pub fn fallback_image_url(&self, index: usize) -> String {
        self.fallback_image_template
            .replace("{index}", &index.to_string())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn text_model(mut self, model: Arc<dyn TextModel>) -> Self {
        self.config.text_model = Some(model);
        self
    }

    pub fn image_model(mut self, model: Arc<dyn ImageModel>) -> Self {
        self.config.image_model = Some(model);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn image_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.image_endpoint = url.into();
        self
    }

    pub fn image_model_name(mut self, name: impl Into<String>) -> Self {
        self.config.image_model_name = name.into();
        self
    }

    pub fn image_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.image_api_key = Some(key.into());
        self
    }

    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.config.image_size = size.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn limits(mut self, limits: GenerationLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn context_radius(mut self, chars: usize) -> Self {
        self.config.context_radius = chars;
        self
    }

    pub fn image_concurrency(mut self, n: usize) -> Self {
        self.config.image_concurrency = n.max(1);
        self
    }

    pub fn post_concurrency(mut self, n: usize) -> Self {
        self.config.post_concurrency = n.max(1);
        self
    }

    pub fn fallback_image_template(mut self, template: impl Into<String>) -> Self {
        self.config.fallback_image_template = template.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ContentGenError> {
        let c = &self.config;
        if c.image_concurrency == 0 || c.post_concurrency == 0 {
            return Err(ContentGenError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if !c.fallback_image_template.contains("{index}") {
            return Err(ContentGenError::InvalidConfig(format!(
                "Fallback image template must contain '{{index}}', got '{}'",
                c.fallback_image_template
            )));
        }
        if c.max_tokens == 0 {
            return Err(ContentGenError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        c.limits.validate()?;
        Ok(self.config)
    }
}

// ── Limits ───────────────────────────────────────────────────────────────

/// Inclusive character-length bounds for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Inclusive integer bounds plus the value used when the field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntBounds {
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

impl IntBounds {
    pub const fn new(min: i64, max: i64, default: i64) -> Self {
        Self { min, max, default }
    }
}

/// Every bound the request validator enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLimits {
    /// Blog keyword / topic length.
    pub keyword: LengthBounds,
    /// Social post topic length.
    pub topic: LengthBounds,
    /// Optional related-keywords string, max length.
    pub related_keywords_max: usize,
    /// Optional caller-supplied title, max length.
    pub title_max: usize,
    /// Optional free-text instructions, max length.
    pub instructions_max: usize,
    /// Optional comma-separated SEO keywords, max length.
    pub seo_keywords_max: usize,
    /// Blog target word count.
    pub blog_word_count: IntBounds,
    /// Images per blog post.
    pub blog_image_count: IntBounds,
    /// Posts per social batch.
    pub social_post_count: IntBounds,
    /// Images per social post.
    pub social_image_count: IntBounds,
    /// Optional social max-length hint (characters); its `default` is unused.
    pub social_max_length: IntBounds,
    /// Accepted tones (matched case-insensitively).
    pub tones: Vec<String>,
    /// Tone used when the request leaves it blank. Must be in `tones`.
    pub default_tone: String,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            keyword: LengthBounds::new(3, 100),
            topic: LengthBounds::new(5, 200),
            related_keywords_max: 200,
            title_max: 150,
            instructions_max: 1000,
            seo_keywords_max: 500,
            blog_word_count: IntBounds::new(50, 3000, 700),
            blog_image_count: IntBounds::new(0, 5, 0),
            social_post_count: IntBounds::new(1, 5, 1),
            social_image_count: IntBounds::new(0, 3, 0),
            social_max_length: IntBounds::new(20, 5000, 280),
            tones: [
                DEFAULT_TONE,
                "professional",
                "casual",
                "informative",
                "persuasive",
                "humorous",
                "authoritative",
                "inspirational",
                "enthusiastic",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_tone: DEFAULT_TONE.to_string(),
        }
    }
}

impl GenerationLimits {
    fn validate(&self) -> Result<(), ContentGenError> {
        let lengths = [("keyword", self.keyword), ("topic", self.topic)];
        for (name, b) in lengths {
            if b.min > b.max {
                return Err(ContentGenError::InvalidConfig(format!(
                    "{name} length bounds are inverted ({} > {})",
                    b.min, b.max
                )));
            }
        }

        let ints = [
            ("blog_word_count", self.blog_word_count),
            ("blog_image_count", self.blog_image_count),
            ("social_post_count", self.social_post_count),
            ("social_image_count", self.social_image_count),
        ];
        for (name, b) in ints {
            if b.min > b.max {
                return Err(ContentGenError::InvalidConfig(format!(
                    "{name} bounds are inverted ({} > {})",
                    b.min, b.max
                )));
            }
            if b.default < b.min || b.default > b.max {
                return Err(ContentGenError::InvalidConfig(format!(
                    "{name} default {} is outside {}–{}",
                    b.default, b.min, b.max
                )));
            }
            if b.min < 0 {
                return Err(ContentGenError::InvalidConfig(format!(
                    "{name} minimum must not be negative"
                )));
            }
        }
        if self.social_post_count.min < 1 {
            return Err(ContentGenError::InvalidConfig(
                "social_post_count minimum must be ≥ 1".into(),
            ));
        }
        if self.social_max_length.min > self.social_max_length.max {
            return Err(ContentGenError::InvalidConfig(
                "social_max_length bounds are inverted".into(),
            ));
        }

        if !self
            .tones
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.default_tone))
        {
            return Err(ContentGenError::InvalidConfig(format!(
                "default tone '{}' is not in the tone list",
                self.default_tone
            )));
        }
        Ok(())
    }
}
