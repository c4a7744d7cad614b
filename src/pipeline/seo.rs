//! SEO stage: optional keyword-integrating rewrite.
//!
//! Inside the generation pipeline a failed rewrite is never fatal: the
//! original content is kept and a [`PipelineWarning::SeoRewriteFailed`] is
//! recorded. The standalone `optimize_for_seo` operation calls [`rewrite`]
//! directly and treats failure as an error.

use crate::error::{ModelError, PipelineWarning};
use crate::pipeline::postprocess::clean_body;
use crate::prompts;
use crate::provider::TextModel;
use tracing::{debug, info, warn};

/// Trimmed keywords, or `None` when blank. The rewrite is skipped for `None`.
pub fn effective_keywords(keywords: Option<&str>) -> Option<&str> {
    keywords.map(str::trim).filter(|k| !k.is_empty())
}

/// Rewrite `content` around `keywords`. An empty reply is an error.
pub async fn rewrite(
    model: &dyn TextModel,
    content: &str,
    keywords: &str,
) -> Result<String, ModelError> {
    let prompt = prompts::seo_rewrite_prompt(content, keywords);
    debug!("SEO prompt: {} chars", prompt.len());
    let reply = model.complete(&prompt).await?;
    let cleaned = clean_body(&reply);
    if cleaned.is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(cleaned)
}

/// Apply the rewrite when `keywords` is non-blank.
///
/// Returns the content to use and the warning, if the rewrite failed.
pub async fn apply_optional(
    model: &dyn TextModel,
    content: String,
    keywords: Option<&str>,
) -> (String, Option<PipelineWarning>) {
    let Some(keywords) = effective_keywords(keywords) else {
        return (content, None);
    };

    info!("SEO rewrite for keywords: {keywords}");
    match rewrite(model, &content, keywords).await {
        Ok(rewritten) => (rewritten, None),
        Err(e) => {
            warn!("SEO rewrite failed, keeping original content: {e}");
            (
                content,
                Some(PipelineWarning::SeoRewriteFailed {
                    detail: e.to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        reply: Result<String, ModelError>,
    }

    impl Counting {
        fn new(reply: Result<&str, ModelError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.map(String::from),
            }
        }
    }

    #[async_trait]
    impl TextModel for Counting {
        async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn blank_keywords_skip_the_model() {
        let model = Counting::new(Ok("rewritten"));
        for kw in [None, Some(""), Some("   \t")] {
            let (content, warning) = apply_optional(&model, "original".into(), kw).await;
            assert_eq!(content, "original");
            assert!(warning.is_none());
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_replaces_content() {
        let model = Counting::new(Ok("```\nRewritten with solar savings.\n```"));
        let (content, warning) = apply_optional(&model, "original".into(), Some(" solar ")).await;
        assert_eq!(content, "Rewritten with solar savings.");
        assert!(warning.is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_keeps_original_and_warns() {
        for reply in [Err(ModelError::Transport("timeout".into())), Ok("   ")] {
            let model = Counting::new(reply);
            let (content, warning) = apply_optional(&model, "original".into(), Some("solar")).await;
            assert_eq!(content, "original");
            assert!(matches!(warning, Some(PipelineWarning::SeoRewriteFailed { .. })));
        }
    }
}
