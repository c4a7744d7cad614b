//! Streaming API: emit social posts as they complete.
//!
//! A batch of five variations with images can take a while. Streaming lets
//! callers show each post as soon as it is ready instead of waiting for the
//! slowest one.
//!
//! Unlike the eager [`crate::generate::generate_social_media_post`], which
//! returns only after every post finishes, [`generate_post_stream`] yields
//! each [`SocialPostResult`] in completion order (sort by `position` if
//! order matters). Up to `post_concurrency` posts run at once.

use crate::config::PipelineConfig;
use crate::error::ContentGenError;
use crate::generate::generate_single_post;
use crate::output::SocialPostResult;
use crate::provider::{resolve_image_model, resolve_text_model};
use crate::request::{validate_social_post, SocialPostInput};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of social post results.
pub type PostStream = Pin<Box<dyn Stream<Item = Result<SocialPostResult, ContentGenError>> + Send>>;

/// Generate social posts, streaming them as they are ready.
///
/// Validation and provider resolution happen before the stream is returned,
/// so those errors surface as the outer `Err`. Each stream item is one post:
/// `Err` there means that post's text stage failed.
///
/// # Example
/// ```rust,no_run
/// use edgequake_contentgen::{generate_post_stream, PipelineConfig, RawNumber, SocialPostInput};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let input = SocialPostInput {
///     topic: Some("Launching our new app".into()),
///     platform: Some("linkedin".into()),
///     post_count: Some(RawNumber::Int(3)),
///     ..Default::default()
/// };
/// let config = PipelineConfig::default();
/// let mut posts = generate_post_stream(&input, &config).await?;
/// while let Some(post) = posts.next().await {
///     match post {
///         Ok(p) => println!("Post {}: {}", p.position, p.content),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn generate_post_stream(
    input: &SocialPostInput,
    config: &PipelineConfig,
) -> Result<PostStream, ContentGenError> {
    let req = Arc::new(validate_social_post(input, &config.limits)?);
    info!(
        "Generating {} {} post(s) about '{}', {} image(s) each",
        req.post_count, req.platform, req.topic, req.image_count
    );

    let text_model = resolve_text_model(config)?;
    let image_model = if req.image_count > 0 {
        Some(resolve_image_model(config)?)
    } else {
        None
    };

    let post_count = req.post_count;
    let concurrency = config.post_concurrency.max(1);
    let config_clone = config.clone();

    let s = stream::iter((1..=post_count).map(move |position| {
        let text_model = Arc::clone(&text_model);
        let image_model = image_model.clone();
        let req = Arc::clone(&req);
        let cfg = config_clone.clone();
        async move {
            generate_single_post(
                text_model.as_ref(),
                image_model.as_deref(),
                &req,
                position,
                &cfg,
            )
            .await
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
