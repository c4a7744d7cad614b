//! Eager generation entry points.
//!
//! Each function validates its input, resolves the model backends, runs the
//! pipeline stages in order and returns an immutable result. The policy for
//! which failures are fatal lives here and nowhere else:
//!
//! | Failure             | Fatal | Surface                                  |
//! |---------------------|-------|------------------------------------------|
//! | validation          | yes   | `Err(ContentGenError::Validation)`       |
//! | text generation     | yes   | `Err(ContentGenError::Generation)`       |
//! | image synthesis     | no    | fallback reference + `ImageFallback`     |
//! | SEO rewrite         | no    | original content + `SeoRewriteFailed`    |
//!
//! Use [`crate::stream::generate_post_stream`] to receive social posts as
//! they complete instead of waiting for the whole batch.

use crate::config::PipelineConfig;
use crate::error::{ContentGenError, PipelineWarning, ValidationError, Violation};
use crate::output::{
    GenerationResult, HeadingSuggestions, PostBatch, SeoOptimized, SocialPostOutput,
    SocialPostResult,
};
use crate::pipeline::images::{self, ImageOutcome};
use crate::pipeline::{placeholder, seo, text};
use crate::progress::Stage;
use crate::prompts::ImageSubject;
use crate::provider::{resolve_image_model, resolve_text_model, ImageModel, TextModel};
use crate::request::{
    validate_blog_post, validate_topic, BlogPostInput, SocialPostInput,
    SocialPostRequest,
};
use crate::stream::generate_post_stream;
use futures::TryStreamExt;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a blog post.
///
/// # Errors
/// Returns `Err` only for fatal failures: invalid input, an unconfigured
/// provider, or a text stage that produced no usable title/content. Image
/// and SEO failures are recorded in [`GenerationResult::warnings`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_contentgen::{generate_blog_post, BlogPostInput, PipelineConfig, RawNumber};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let input = BlogPostInput {
///     keyword: Some("Solar Panels".into()),
///     image_count: Some(RawNumber::Int(2)),
///     ..Default::default()
/// };
/// let config = PipelineConfig::default();
/// let post = generate_blog_post(&input, &config).await?;
/// println!("{}\n\n{}", post.title, post.content);
/// # Ok(())
/// # }
/// ```
pub async fn generate_blog_post(
    input: &BlogPostInput,
    config: &PipelineConfig,
) -> Result<GenerationResult, ContentGenError> {
    let start = Instant::now();
    let req = validate_blog_post(input, &config.limits)?;
    info!(
        "Generating blog post: '{}' (~{} words, {} image(s))",
        req.keyword, req.word_count, req.image_count
    );

    let text_model = resolve_text_model(config)?;
    let image_model = if req.image_count > 0 {
        Some(resolve_image_model(config)?)
    } else {
        None
    };

    // ── Step 1: Title + content ──────────────────────────────────────────
    stage_start(config, Stage::Text);
    let draft = text::generate_blog_draft(text_model.as_ref(), &req).await?;
    debug!(
        "Draft: {} chars, {} placeholder(s)",
        draft.content.len(),
        placeholder::parse(&draft.content).len()
    );

    // ── Step 2: Images, from the pre-rewrite text ────────────────────────
    let images = match image_model {
        Some(ref image_model) => {
            stage_start(config, Stage::Images);
            images::synthesize_images(
                text_model.as_ref(),
                image_model.as_ref(),
                &ImageSubject::for_blog(&req),
                &draft.content,
                req.image_count,
                config,
            )
            .await
        }
        None => ImageOutcome::default(),
    };
    let mut warnings = images.warnings;

    // ── Step 3: Optional SEO rewrite ─────────────────────────────────────
    let content = seo_stage(
        text_model.as_ref(),
        draft.content,
        req.seo_keywords.as_deref(),
        config,
        &mut warnings,
    )
    .await;

    // ── Step 4: Strip placeholders, record anchors ───────────────────────
    let resolved = placeholder::strip(&content, req.image_count);

    info!(
        "Blog post complete: {} chars, {} image(s), {} warning(s), {}ms",
        resolved.text.len(),
        images.urls.len(),
        warnings.len(),
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(images.urls.len(), warnings.len());
    }

    Ok(GenerationResult {
        title: draft.title,
        content: resolved.text,
        thumbnail_url: images.urls.first().cloned(),
        image_urls: images.urls,
        image_anchors: resolved.anchors,
        warnings,
    })
}

/// Synchronous wrapper around [`generate_blog_post`].
///
/// Creates a temporary tokio runtime internally; do not call from inside
/// an async context.
pub fn generate_blog_post_sync(
    input: &BlogPostInput,
    config: &PipelineConfig,
) -> Result<GenerationResult, ContentGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ContentGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_blog_post(input, config))
}

/// Generate one social post, or a batch of variations when
/// `post_count > 1`.
///
/// Batch posts run concurrently (up to `post_concurrency`) and are returned
/// sorted by position. Any post whose text stage fails fails the batch.
pub async fn generate_social_media_post(
    input: &SocialPostInput,
    config: &PipelineConfig,
) -> Result<SocialPostOutput, ContentGenError> {
    let start = Instant::now();
    let stream = generate_post_stream(input, config).await?;
    let mut posts: Vec<SocialPostResult> = stream.try_collect().await?;
    posts.sort_by_key(|p| p.position);

    let images: usize = posts.iter().map(|p| p.image_urls.len()).sum();
    let warnings: usize = posts.iter().map(|p| p.warnings.len()).sum();
    info!(
        "Social generation complete: {} post(s), {}ms",
        posts.len(),
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(images, warnings);
    }

    if posts.len() == 1 {
        if let Some(post) = posts.pop() {
            return Ok(SocialPostOutput::Single(post));
        }
    }
    Ok(SocialPostOutput::Batch(PostBatch { posts }))
}

/// Rewrite `content` so it integrates `keywords`.
///
/// Unlike the rewrite inside [`generate_blog_post`], failure here is an
/// error: there is no other output to fall back to.
pub async fn optimize_for_seo(
    content: &str,
    keywords: &str,
    config: &PipelineConfig,
) -> Result<SeoOptimized, ContentGenError> {
    let keywords = keywords.trim();
    if keywords.is_empty() {
        return Err(ValidationError::new("keywords", Violation::Required).into());
    }
    if keywords.chars().count() > config.limits.seo_keywords_max {
        return Err(ValidationError::new(
            "keywords",
            Violation::TooLong {
                max: config.limits.seo_keywords_max,
                actual: keywords.chars().count(),
            },
        )
        .into());
    }
    if content.trim().is_empty() {
        return Err(ValidationError::new("content", Violation::Required).into());
    }

    let text_model = resolve_text_model(config)?;
    stage_start(config, Stage::SeoRewrite);
    let optimized_content = seo::rewrite(text_model.as_ref(), content, keywords)
        .await
        .map_err(|e| ContentGenError::RewriteFailed {
            detail: e.to_string(),
        })?;

    info!("SEO rewrite complete: {} chars", optimized_content.len());
    Ok(SeoOptimized { optimized_content })
}

/// Suggest section headings for a blog topic.
pub async fn suggest_blog_headings(
    topic: &str,
    config: &PipelineConfig,
) -> Result<HeadingSuggestions, ContentGenError> {
    let topic = validate_topic("topic", topic, config.limits.keyword)?;
    let text_model = resolve_text_model(config)?;

    stage_start(config, Stage::Headings);
    let headings = text::generate_headings(text_model.as_ref(), &topic).await?;
    info!("Suggested {} heading(s) for '{}'", headings.len(), topic);
    Ok(HeadingSuggestions { headings })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the pipeline for post `position` (1-based) of a social batch.
pub(crate) async fn generate_single_post(
    text_model: &dyn TextModel,
    image_model: Option<&dyn ImageModel>,
    req: &SocialPostRequest,
    position: usize,
    config: &PipelineConfig,
) -> Result<SocialPostResult, ContentGenError> {
    debug!("Generating post {}/{}", position, req.post_count);

    stage_start(config, Stage::Text);
    let draft = text::generate_social_draft(text_model, req, position).await?;

    let images = match image_model {
        Some(image_model) if req.image_count > 0 => {
            stage_start(config, Stage::Images);
            images::synthesize_images(
                text_model,
                image_model,
                &ImageSubject::for_social(req),
                &draft.content,
                req.image_count,
                config,
            )
            .await
        }
        _ => ImageOutcome::default(),
    };
    let mut warnings = images.warnings;

    let content = seo_stage(
        text_model,
        draft.content,
        req.seo_keywords.as_deref(),
        config,
        &mut warnings,
    )
    .await;
    let resolved = placeholder::strip(&content, req.image_count);

    Ok(SocialPostResult {
        position,
        content: resolved.text,
        hashtags: draft.hashtags,
        image_urls: images.urls,
        image_anchors: resolved.anchors,
        warnings,
    })
}

/// Optional SEO rewrite; a failure is pushed onto `warnings`.
async fn seo_stage(
    text_model: &dyn TextModel,
    content: String,
    keywords: Option<&str>,
    config: &PipelineConfig,
    warnings: &mut Vec<PipelineWarning>,
) -> String {
    if seo::effective_keywords(keywords).is_none() {
        return content;
    }
    stage_start(config, Stage::SeoRewrite);
    let (content, warning) = seo::apply_optional(text_model, content, keywords).await;
    if let Some(warning) = warning {
        if let Some(ref cb) = config.progress_callback {
            cb.on_warning(&warning);
        }
        warnings.push(warning);
    }
    content
}

fn stage_start(config: &PipelineConfig, stage: Stage) {
    debug!("Stage: {stage}");
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}
