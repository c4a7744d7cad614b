//! Image stage: one image per placeholder slot, with per-slot fallback.
//!
//! For each index `i` in `1..=count` the stage cuts a context window around
//! the slot's token, asks the text model to describe an image for it, and
//! sends that description to the image model. Any failure along the way is
//! local to the slot: it receives the deterministic fallback reference and
//! a [`PipelineWarning::ImageFallback`], and the other slots carry on.
//!
//! Slots run one at a time by default. With `image_concurrency > 1` they run
//! through an order-preserving `buffered` stream, so `urls[i - 1]` always
//! belongs to index `i`.

use crate::config::PipelineConfig;
use crate::error::{FallbackCause, ModelError, PipelineWarning};
use crate::pipeline::placeholder;
use crate::pipeline::postprocess::clean_image_prompt;
use crate::prompts::{self, ImageSubject};
use crate::provider::{ImageModel, TextModel};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Filled image slots, in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOutcome {
    /// `urls[i - 1]` is the reference for index `i`; always `count` long.
    pub urls: Vec<String>,
    /// One `ImageFallback` per slot that fell back.
    pub warnings: Vec<PipelineWarning>,
}

/// Fill `count` image slots for `text` (the token-bearing generated text).
///
/// Never fails: slots that cannot be synthesised use
/// [`PipelineConfig::fallback_image_url`].
pub async fn synthesize_images(
    text_model: &dyn TextModel,
    image_model: &dyn ImageModel,
    subject: &ImageSubject,
    text: &str,
    count: usize,
    config: &PipelineConfig,
) -> ImageOutcome {
    if count == 0 {
        return ImageOutcome::default();
    }

    let tokens = placeholder::parse(text);
    let contexts: Vec<String> = (1..=count)
        .map(|i| match placeholder::locate(&tokens, i) {
            Some(token) => placeholder::context_window(text, token, config.context_radius),
            None => {
                debug!("Image {i}: no placeholder in text, using topic only");
                String::new()
            }
        })
        .collect();

    info!(
        "Synthesising {count} image(s), concurrency {}",
        config.image_concurrency
    );

    let slots: Vec<(usize, Result<String, FallbackCause>)> = stream::iter(
        contexts.into_iter().enumerate(),
    )
    .map(|(slot, context)| async move {
        let index = slot + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(index, count);
        }
        let result = synthesize_one(text_model, image_model, subject, &context).await;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_complete(index, count, result.is_err());
        }
        (index, result)
    })
    .buffered(config.image_concurrency.max(1))
    .collect()
    .await;

    let mut outcome = ImageOutcome {
        urls: Vec::with_capacity(count),
        warnings: Vec::new(),
    };
    for (index, result) in slots {
        match result {
            Ok(reference) => outcome.urls.push(reference),
            Err(cause) => {
                warn!("Image {index}: {cause}; using fallback");
                let warning = PipelineWarning::ImageFallback { index, cause };
                if let Some(ref cb) = config.progress_callback {
                    cb.on_warning(&warning);
                }
                outcome.urls.push(config.fallback_image_url(index));
                outcome.warnings.push(warning);
            }
        }
    }
    outcome
}

/// Prompt, then synthesise, one slot.
async fn synthesize_one(
    text_model: &dyn TextModel,
    image_model: &dyn ImageModel,
    subject: &ImageSubject,
    context: &str,
) -> Result<String, FallbackCause> {
    let request = prompts::image_prompt_request(subject, context);
    let reply = text_model
        .complete(&request)
        .await
        .map_err(|e| FallbackCause::PromptFailed {
            detail: e.to_string(),
        })?;

    let prompt = clean_image_prompt(&reply);
    if prompt.is_empty() {
        return Err(FallbackCause::EmptyPrompt);
    }
    debug!("Image prompt: {} chars", prompt.len());

    let reference = image_model
        .synthesize(&prompt)
        .await
        .map_err(|e| match e {
            ModelError::EmptyResponse => FallbackCause::EmptyImage,
            other => FallbackCause::SynthesisFailed {
                detail: other.to_string(),
            },
        })?;

    let reference = reference.trim();
    if reference.is_empty() {
        return Err(FallbackCause::EmptyImage);
    }
    Ok(reference.to_string())
}
