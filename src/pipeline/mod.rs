//! Pipeline stages for content generation.
//!
//! Each submodule implements exactly one step. Stages return typed results;
//! which failures are fatal is decided once, in [`crate::generate`].
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ text ──▶ images ──▶ seo ──▶ placeholder::strip
//!           (draft)  (per slot)  (opt.)   (anchors, clean text)
//! ```
//!
//! 1. [`text`]:        prompt the text model, parse its JSON reply
//! 2. [`placeholder`]: locate `[IMAGE_PLACEHOLDER_n]` tokens
//! 3. [`images`]:      describe + synthesise one image per slot, falling
//!    back per index
//! 4. [`seo`]:         optional keyword rewrite, never fatal
//! 5. [`postprocess`]: deterministic cleanup rules for model text

pub mod images;
pub mod placeholder;
pub mod postprocess;
pub mod seo;
pub mod text;
