//! Error types for the edgequake-contentgen library.
//!
//! Failures fall into two groups, and the pipeline treats them differently:
//!
//! * [`ContentGenError`] is **fatal**. The request cannot produce a result
//!   (bad input, the text model returned nothing usable, an export canvas
//!   could not be allocated). It comes back as `Err(ContentGenError)` from
//!   the top-level entry points.
//!
//! * [`PipelineWarning`] is **non-fatal**. One image slot fell back to its
//!   placeholder reference, or the SEO rewrite was rejected and the original
//!   text kept. Warnings are stored on the result so callers can report them
//!   without losing the rest of the output.
//!
//! | Kind              | Fatal | Surface                         |
//! |-------------------|-------|---------------------------------|
//! | ValidationError   | yes   | `Err(ContentGenError::Validation)` |
//! | GenerationFailure | yes   | `Err(ContentGenError::Generation)` |
//! | SynthesisFailure  | no    | fallback image + `PipelineWarning::ImageFallback` |
//! | RewriteFailure    | no    | original content + `PipelineWarning::SeoRewriteFailed` |
//! | ExportFailure     | yes   | `Err(ContentGenError::Export)`  |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-contentgen library.
#[derive(Debug, Error)]
pub enum ContentGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A request field violated its declared constraint. Raised before any
    /// model call is made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The text stage produced nothing usable.
    #[error("Content generation failed: {reason}{}", detail_suffix(.detail))]
    Generation {
        reason: GenerationFailure,
        detail: Option<String>,
    },

    /// A standalone SEO rewrite (see `optimize_for_seo`) failed.
    #[error("SEO rewrite failed: {detail}")]
    RewriteFailed { detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured model backend is not initialised (missing API key etc.).
    #[error("Model provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Rasterisation, page slicing or document assembly failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" ({d})"),
        _ => String::new(),
    }
}

impl ContentGenError {
    /// Shorthand for a [`ContentGenError::Generation`] with a detail message.
    pub fn generation(reason: GenerationFailure, detail: impl Into<String>) -> Self {
        ContentGenError::Generation {
            reason,
            detail: Some(detail.into()),
        }
    }

    /// The generation sub-reason, when this is a generation failure.
    pub fn generation_reason(&self) -> Option<GenerationFailure> {
        match self {
            ContentGenError::Generation { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Why the text stage could not produce a usable result.
///
/// The four cases are kept apart so callers can tell "the model said
/// nothing" from "the model forgot the title".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailure {
    /// The model call failed, or its reply was empty or unparseable.
    NoOutput,
    /// A reply arrived but its title was absent or blank.
    TitleMissing,
    /// A reply arrived but its content was absent or blank.
    ContentMissing,
    /// A reply arrived but neither title nor content were usable.
    BothMissing,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GenerationFailure::NoOutput => "the model returned no output",
            GenerationFailure::TitleMissing => "the model output is missing a title",
            GenerationFailure::ContentMissing => "the model output is missing the content",
            GenerationFailure::BothMissing => "the model output is missing both title and content",
        };
        f.write_str(s)
    }
}

// ── Validation ───────────────────────────────────────────────────────────

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Invalid field '{field}': {violation}")]
pub struct ValidationError {
    /// Name of the offending input field, e.g. `"word_count"`.
    pub field: String,
    /// The bound that was violated.
    pub violation: Violation,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, violation: Violation) -> Self {
        Self {
            field: field.into(),
            violation,
        }
    }
}

/// The specific constraint a field violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The field is required but was absent or blank.
    Required,
    /// Text shorter than the minimum length (characters).
    TooShort { min: usize, actual: usize },
    /// Text longer than the maximum length (characters).
    TooLong { max: usize, actual: usize },
    /// Number below the minimum.
    BelowMinimum { min: i64, actual: i64 },
    /// Number above the maximum.
    AboveMaximum { max: i64, actual: i64 },
    /// The value could not be read as an integer.
    NotAnInteger { value: String },
    /// The value is not one of the allowed choices.
    NotInSet { value: String, allowed: Vec<String> },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Required => write!(f, "a value is required"),
            Violation::TooShort { min, actual } => {
                write!(f, "must be at least {min} characters (got {actual})")
            }
            Violation::TooLong { max, actual } => {
                write!(f, "must be at most {max} characters (got {actual})")
            }
            Violation::BelowMinimum { min, actual } => {
                write!(f, "must be at least {min} (got {actual})")
            }
            Violation::AboveMaximum { max, actual } => {
                write!(f, "must be at most {max} (got {actual})")
            }
            Violation::NotAnInteger { value } => write!(f, "'{value}' is not a whole number"),
            Violation::NotInSet { value, allowed } => {
                write!(f, "'{value}' is not one of: {}", allowed.join(", "))
            }
        }
    }
}

// ── Model backends ───────────────────────────────────────────────────────

/// Error returned by a [`crate::provider::TextModel`] or
/// [`crate::provider::ImageModel`] call.
///
/// The pipeline decides per stage whether this is fatal; the backend only
/// reports what went wrong.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The backend API returned an error.
    #[error("model API error: {0}")]
    Api(String),

    /// The HTTP transport failed before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call succeeded but carried no usable payload.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

// ── Export ───────────────────────────────────────────────────────────────

/// Fatal failure while exporting a rendered block.
///
/// Export is all-or-nothing: none of these leave a partial document behind.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The rendered block has no pixels to paginate.
    #[error("Rendered block is empty ({width}x{height} px)")]
    EmptySource { width: u32, height: u32 },

    /// Page size, margin or scale do not leave a drawable area.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// A page canvas could not be allocated.
    #[error("Could not acquire a {width}x{height} px drawing canvas for page {page}")]
    CanvasUnavailable { page: usize, width: u32, height: u32 },

    /// The block rasteriser failed.
    #[error("Rasterisation failed: {0}")]
    Rasterize(String),

    /// Encoding a page image failed.
    #[error("Failed to encode page {page}: {detail}")]
    Encode { page: usize, detail: String },

    /// Assembling the PDF document failed.
    #[error("Failed to assemble document: {0}")]
    Document(String),

    /// The blocking export task panicked or was cancelled.
    #[error("Export task failed: {0}")]
    Task(String),
}

// ── Non-fatal warnings ───────────────────────────────────────────────────

/// Why an image slot was filled with its fallback reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackCause {
    /// Asking the text model for an image prompt failed.
    PromptFailed { detail: String },
    /// The text model returned a blank image prompt.
    EmptyPrompt,
    /// The image backend returned an error.
    SynthesisFailed { detail: String },
    /// The image backend returned no image reference.
    EmptyImage,
}

impl fmt::Display for FallbackCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackCause::PromptFailed { detail } => write!(f, "image prompt failed: {detail}"),
            FallbackCause::EmptyPrompt => write!(f, "image prompt was empty"),
            FallbackCause::SynthesisFailed { detail } => {
                write!(f, "image synthesis failed: {detail}")
            }
            FallbackCause::EmptyImage => write!(f, "image backend returned nothing"),
        }
    }
}

/// A recovered failure recorded on a result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Image slot `index` (1-based) uses the deterministic fallback.
    #[error("Image {index}: using fallback image ({cause})")]
    ImageFallback { index: usize, cause: FallbackCause },

    /// The SEO rewrite failed; the pre-rewrite content was kept.
    #[error("SEO rewrite skipped, original content kept: {detail}")]
    SeoRewriteFailed { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field_and_bound() {
        let e = ValidationError::new(
            "word_count",
            Violation::AboveMaximum {
                max: 3000,
                actual: 5000,
            },
        );
        let msg = e.to_string();
        assert!(msg.contains("word_count"), "got: {msg}");
        assert!(msg.contains("3000"), "got: {msg}");
        assert!(msg.contains("5000"), "got: {msg}");
    }

    #[test]
    fn generation_failure_reasons_are_distinct() {
        let reasons = [
            GenerationFailure::NoOutput,
            GenerationFailure::TitleMissing,
            GenerationFailure::ContentMissing,
            GenerationFailure::BothMissing,
        ];
        let messages: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn generation_display_includes_detail() {
        let e = ContentGenError::generation(GenerationFailure::NoOutput, "HTTP 500");
        let msg = e.to_string();
        assert!(msg.contains("no output"), "got: {msg}");
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert_eq!(e.generation_reason(), Some(GenerationFailure::NoOutput));
    }

    #[test]
    fn generation_display_without_detail() {
        let e = ContentGenError::Generation {
            reason: GenerationFailure::TitleMissing,
            detail: None,
        };
        assert!(!e.to_string().contains('('));
    }

    #[test]
    fn not_in_set_lists_choices() {
        let v = Violation::NotInSet {
            value: "myspace".into(),
            allowed: vec!["twitter".into(), "linkedin".into()],
        };
        assert_eq!(v.to_string(), "'myspace' is not one of: twitter, linkedin");
    }

    #[test]
    fn canvas_unavailable_display() {
        let e = ExportError::CanvasUnavailable {
            page: 2,
            width: 10,
            height: 20,
        };
        assert!(e.to_string().contains("page 2"));
        assert!(e.to_string().contains("10x20"));
    }

    #[test]
    fn warning_serialises_with_kind_tag() {
        let w = PipelineWarning::ImageFallback {
            index: 2,
            cause: FallbackCause::EmptyPrompt,
        };
        let json = serde_json::to_string(&w).expect("serialise");
        assert!(json.contains("\"kind\":\"image_fallback\""), "got: {json}");
        assert!(json.contains("\"index\":2"), "got: {json}");
    }
}
