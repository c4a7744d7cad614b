//! Result types returned by the generation entry points.
//!
//! All of them serialise with serde, so the CLI's `--json` mode and any
//! HTTP layer an embedder puts in front can hand them out unchanged.

use crate::error::PipelineWarning;
use serde::{Deserialize, Serialize};

/// A generated blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Plain-text title (caller-supplied or generated).
    pub title: String,

    /// Post body. Plain text with `**bold**` sub-headings; never contains
    /// placeholder tokens.
    pub content: String,

    /// One reference per requested image, in index order. A slot whose
    /// synthesis failed holds its fallback reference.
    pub image_urls: Vec<String>,

    /// `image_urls[0]`, when any images were requested.
    pub thumbnail_url: Option<String>,

    /// `image_anchors[i - 1]` is the byte offset in `content` where image
    /// `i` belongs, or `None` when the model left out its placeholder.
    pub image_anchors: Vec<Option<usize>>,

    /// Recovered failures (image fallbacks, skipped SEO rewrite).
    pub warnings: Vec<PipelineWarning>,
}

impl GenerationResult {
    /// Indices (1-based) of images that use their fallback reference.
    pub fn fallback_indices(&self) -> Vec<usize> {
        fallback_indices(&self.warnings)
    }
}

/// One generated social post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPostResult {
    /// 1-based position of the post within its batch.
    pub position: usize,

    /// Post body; never contains placeholder tokens.
    pub content: String,

    /// Hashtags, each starting with `#`. Empty when hashtags were not requested.
    pub hashtags: Vec<String>,

    pub image_urls: Vec<String>,

    pub image_anchors: Vec<Option<usize>>,

    pub warnings: Vec<PipelineWarning>,
}

impl SocialPostResult {
    /// Indices (1-based) of images that use their fallback reference.
    pub fn fallback_indices(&self) -> Vec<usize> {
        fallback_indices(&self.warnings)
    }
}

/// Several variations of a social post, ordered by `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBatch {
    pub posts: Vec<SocialPostResult>,
}

/// What `generate_social_media_post` returns: a single post when one was
/// requested, a batch otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SocialPostOutput {
    Single(SocialPostResult),
    Batch(PostBatch),
}

impl SocialPostOutput {
    /// All posts, in position order.
    pub fn posts(&self) -> &[SocialPostResult] {
        match self {
            SocialPostOutput::Single(post) => std::slice::from_ref(post),
            SocialPostOutput::Batch(batch) => &batch.posts,
        }
    }

    pub fn into_posts(self) -> Vec<SocialPostResult> {
        match self {
            SocialPostOutput::Single(post) => vec![post],
            SocialPostOutput::Batch(batch) => batch.posts,
        }
    }
}

/// Result of a standalone SEO rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoOptimized {
    pub optimized_content: String,
}

/// Suggested section headings, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingSuggestions {
    pub headings: Vec<String>,
}

fn fallback_indices(warnings: &[PipelineWarning]) -> Vec<usize> {
    warnings
        .iter()
        .filter_map(|w| match w {
            PipelineWarning::ImageFallback { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}
