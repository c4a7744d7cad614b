//! # edgequake-contentgen
//!
//! Generate marketing content (blog posts and social media posts) with a
//! text model, illustrate it with synthesised images, and export it as
//! paginated raster documents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Validate  bounds, tones, platforms; numeric strings coerced
//!  ├─ 2. Text      title + content with [IMAGE_PLACEHOLDER_n] tokens
//!  ├─ 3. Images    per token: context → image prompt → synthesis
//!  │                (any failure: deterministic fallback for that index)
//!  ├─ 4. SEO       optional keyword rewrite (failure keeps original)
//!  └─ 5. Strip     placeholder-free content + image anchors
//!
//! rendered block ──▶ export  page slices → PNG/JPEG pages → PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_contentgen::{generate_blog_post, BlogPostInput, PipelineConfig, RawNumber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Text provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / ...
//!     let config = PipelineConfig::default();
//!     let input = BlogPostInput {
//!         keyword: Some("Solar Panels".into()),
//!         image_count: Some(RawNumber::Int(2)),
//!         ..Default::default()
//!     };
//!     let post = generate_blog_post(&input, &config).await?;
//!     println!("# {}\n\n{}", post.title, post.content);
//!     for warning in &post.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `contentgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-contentgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod request;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationLimits, IntBounds, LengthBounds, PipelineConfig, PipelineConfigBuilder};
pub use error::{
    ContentGenError, ExportError, FallbackCause, GenerationFailure, ModelError, PipelineWarning,
    ValidationError, Violation,
};
pub use export::pdf::{assemble_pdf, export_document_to_file, export_pdf, write_page_images};
pub use export::raster::{
    export_as_document, plan_pages, BlockRasterizer, ExportOptions, PageImageFormat, PageSize,
    PageSlice, PrerenderedBlock, RasterPage,
};
pub use export::text::{render_batch_text, render_blog_text, render_social_text};
pub use generate::{
    generate_blog_post, generate_blog_post_sync, generate_social_media_post, optimize_for_seo,
    suggest_blog_headings,
};
pub use output::{
    GenerationResult, HeadingSuggestions, PostBatch, SeoOptimized, SocialPostOutput,
    SocialPostResult,
};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use provider::{HttpImageModel, ImageModel, LlmTextModel, TextModel};
pub use request::{
    BlogPostInput, BlogPostRequest, Platform, RawNumber, SocialPostInput, SocialPostRequest,
};
pub use stream::{generate_post_stream, PostStream};
