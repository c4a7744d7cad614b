//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as a request moves through its stages and image slots.
//!
//! # Example
//!
//! ```rust
//! use edgequake_contentgen::{GenerationProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FallbackCounter {
//!     fallbacks: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for FallbackCounter {
//!     fn on_image_complete(&self, index: usize, total: usize, fallback: bool) {
//!         if fallback {
//!             self.fallbacks.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("image {index}/{total} ready");
//!     }
//! }
//!
//! let counter = Arc::new(FallbackCounter { fallbacks: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PipelineWarning;
use std::fmt;
use std::sync::Arc;

/// Pipeline stages reported through [`GenerationProgressCallback::on_stage_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Prompting the model for the title/content or post body.
    Text,
    /// Synthesising the images for placeholder slots.
    Images,
    /// Rewriting content for SEO keywords.
    SeoRewrite,
    /// Suggesting headings for a topic.
    Headings,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Text => "text",
            Stage::Images => "images",
            Stage::SeoRewrite => "seo rewrite",
            Stage::Headings => "headings",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as a request progresses.
///
/// Implementations must be `Send + Sync`: image slots and batch posts may run
/// concurrently. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// A stage is about to start.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Image slot `index` (1-based) of `total` is about to be synthesised.
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Image slot `index` has been filled; `fallback` is true when the
    /// deterministic fallback reference was used.
    fn on_image_complete(&self, index: usize, total: usize, fallback: bool) {
        let _ = (index, total, fallback);
    }

    /// A recoverable failure was absorbed.
    fn on_warning(&self, warning: &PipelineWarning) {
        let _ = warning;
    }

    /// The request finished with `images` filled slots and `warnings` warnings.
    fn on_generation_complete(&self, images: usize, warnings: usize) {
        let _ = (images, warnings);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FallbackCause;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        images: AtomicUsize,
        fallbacks: AtomicUsize,
        warnings: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_image_complete(&self, _index: usize, _total: usize, fallback: bool) {
            self.images.fetch_add(1, Ordering::SeqCst);
            if fallback {
                self.fallbacks.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_warning(&self, _warning: &PipelineWarning) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Text);
        cb.on_image_start(1, 2);
        cb.on_image_complete(1, 2, false);
        cb.on_warning(&PipelineWarning::SeoRewriteFailed {
            detail: "timeout".into(),
        });
        cb.on_generation_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_start(Stage::Text);
        tracker.on_stage_start(Stage::Images);
        tracker.on_image_complete(1, 2, false);
        tracker.on_image_complete(2, 2, true);
        tracker.on_warning(&PipelineWarning::ImageFallback {
            index: 2,
            cause: FallbackCause::EmptyImage,
        });

        assert_eq!(*tracker.stages.lock().unwrap(), vec![Stage::Text, Stage::Images]);
        assert_eq!(tracker.images.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.fallbacks.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.warnings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::SeoRewrite);
        assert_eq!(Stage::SeoRewrite.to_string(), "seo rewrite");
    }
}
