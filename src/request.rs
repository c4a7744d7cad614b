//! Request validation: raw form/CLI fields → normalised requests.
//!
//! Raw inputs arrive the way a form or a CLI hands them over: every field
//! optional, numbers possibly typed as strings. Validation trims text,
//! coerces numeric-looking strings, applies the configured
//! [`GenerationLimits`], and either returns a normalised request or the
//! first [`ValidationError`] it finds. Nothing here touches a model.

use crate::config::{GenerationLimits, IntBounds, LengthBounds};
use crate::error::{ValidationError, Violation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A number as submitted: already an integer, or text that should be one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Text(String),
}

impl From<i64> for RawNumber {
    fn from(v: i64) -> Self {
        RawNumber::Int(v)
    }
}

impl From<&str> for RawNumber {
    fn from(v: &str) -> Self {
        RawNumber::Text(v.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(v: String) -> Self {
        RawNumber::Text(v)
    }
}

/// Raw blog-post request fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostInput {
    pub keyword: Option<String>,
    pub related_keywords: Option<String>,
    pub tone: Option<String>,
    pub word_count: Option<RawNumber>,
    pub image_count: Option<RawNumber>,
    pub title: Option<String>,
    pub seo_keywords: Option<String>,
    pub instructions: Option<String>,
}

/// Raw social-post request fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialPostInput {
    pub topic: Option<String>,
    pub platform: Option<String>,
    pub tone: Option<String>,
    pub instructions: Option<String>,
    pub post_count: Option<RawNumber>,
    pub image_count: Option<RawNumber>,
    pub max_length: Option<RawNumber>,
    pub include_hashtags: Option<bool>,
    pub seo_keywords: Option<String>,
}

/// A validated blog-post request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostRequest {
    pub keyword: String,
    pub related_keywords: Option<String>,
    pub tone: String,
    pub word_count: u32,
    pub image_count: usize,
    /// Caller-supplied title; when present it is used verbatim.
    pub title: Option<String>,
    /// Trimmed SEO keyword string; `None` when blank.
    pub seo_keywords: Option<String>,
    pub instructions: Option<String>,
}

/// A validated social-post request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPostRequest {
    pub topic: String,
    pub platform: Platform,
    pub tone: String,
    pub instructions: Option<String>,
    pub post_count: usize,
    /// Images per post.
    pub image_count: usize,
    pub max_length: Option<u32>,
    pub include_hashtags: bool,
    pub seo_keywords: Option<String>,
}

/// Social platforms a post can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Facebook,
    Instagram,
    LinkedIn,
    Threads,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::Facebook,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::Threads,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
            Platform::Threads => "threads",
        }
    }

    /// Display name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter (X)",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::Threads => "Threads",
        }
    }

    /// Native character limit, used as the length hint when the request has none.
    pub fn native_char_limit(&self) -> u32 {
        match self {
            Platform::Twitter => 280,
            Platform::Facebook => 2000,
            Platform::Instagram => 2200,
            Platform::LinkedIn => 3000,
            Platform::Threads => 500,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::LinkedIn),
            "threads" => Ok(Platform::Threads),
            _ => Err(Violation::NotInSet {
                value: s.trim().to_string(),
                allowed: Platform::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            }),
        }
    }
}

/// Validate and normalise a blog-post request.
pub fn validate_blog_post(
    input: &BlogPostInput,
    limits: &GenerationLimits,
) -> Result<BlogPostRequest, ValidationError> {
    let keyword = required_text("keyword", input.keyword.as_deref(), limits.keyword)?;
    let related_keywords = optional_text(
        "related_keywords",
        input.related_keywords.as_deref(),
        limits.related_keywords_max,
    )?;
    let tone = tone("tone", input.tone.as_deref(), limits)?;
    let word_count = integer("word_count", input.word_count.as_ref(), limits.blog_word_count)?;
    let image_count = integer("image_count", input.image_count.as_ref(), limits.blog_image_count)?;
    let title = optional_text("title", input.title.as_deref(), limits.title_max)?;
    let seo_keywords = optional_text(
        "seo_keywords",
        input.seo_keywords.as_deref(),
        limits.seo_keywords_max,
    )?;
    let instructions = optional_text(
        "instructions",
        input.instructions.as_deref(),
        limits.instructions_max,
    )?;

    Ok(BlogPostRequest {
        keyword,
        related_keywords,
        tone,
        word_count: word_count as u32,
        image_count: image_count as usize,
        title,
        seo_keywords,
        instructions,
    })
}

/// Validate and normalise a social-post request.
pub fn validate_social_post(
    input: &SocialPostInput,
    limits: &GenerationLimits,
) -> Result<SocialPostRequest, ValidationError> {
    let topic = required_text("topic", input.topic.as_deref(), limits.topic)?;
    let platform = match input.platform.as_deref().map(str::trim) {
        None | Some("") => return Err(ValidationError::new("platform", Violation::Required)),
        Some(p) => p
            .parse::<Platform>()
            .map_err(|v| ValidationError::new("platform", v))?,
    };
    let tone = tone("tone", input.tone.as_deref(), limits)?;
    let instructions = optional_text(
        "instructions",
        input.instructions.as_deref(),
        limits.instructions_max,
    )?;
    let post_count = integer("post_count", input.post_count.as_ref(), limits.social_post_count)?;
    let image_count = integer(
        "image_count",
        input.image_count.as_ref(),
        limits.social_image_count,
    )?;
    let max_length = match input.max_length.as_ref() {
        None => None,
        Some(raw) => match coerce_integer("max_length", raw)? {
            None => None,
            Some(n) => Some(check_range("max_length", n, limits.social_max_length)? as u32),
        },
    };
    let seo_keywords = optional_text(
        "seo_keywords",
        input.seo_keywords.as_deref(),
        limits.seo_keywords_max,
    )?;

    Ok(SocialPostRequest {
        topic,
        platform,
        tone,
        instructions,
        post_count: post_count as usize,
        image_count: image_count as usize,
        max_length,
        include_hashtags: input.include_hashtags.unwrap_or(true),
        seo_keywords,
    })
}

/// Validate a standalone topic (used by heading suggestions).
pub fn validate_topic(
    field: &str,
    value: &str,
    bounds: LengthBounds,
) -> Result<String, ValidationError> {
    required_text(field, Some(value), bounds)
}

// ── Field helpers ────────────────────────────────────────────────────────

fn required_text(
    field: &str,
    value: Option<&str>,
    bounds: LengthBounds,
) -> Result<String, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, Violation::Required));
    }
    let len = trimmed.chars().count();
    if len < bounds.min {
        return Err(ValidationError::new(
            field,
            Violation::TooShort {
                min: bounds.min,
                actual: len,
            },
        ));
    }
    if len > bounds.max {
        return Err(ValidationError::new(
            field,
            Violation::TooLong {
                max: bounds.max,
                actual: len,
            },
        ));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text normalises to `None`.
fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            Violation::TooLong { max, actual: len },
        ));
    }
    Ok(Some(trimmed.to_string()))
}

fn tone(
    field: &str,
    value: Option<&str>,
    limits: &GenerationLimits,
) -> Result<String, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Ok(limits.default_tone.clone());
    }
    limits
        .tones
        .iter()
        .find(|t| t.eq_ignore_ascii_case(trimmed))
        .cloned()
        .ok_or_else(|| {
            ValidationError::new(
                field,
                Violation::NotInSet {
                    value: trimmed.to_string(),
                    allowed: limits.tones.clone(),
                },
            )
        })
}

/// Absent or blank values take `bounds.default`.
fn integer(
    field: &str,
    raw: Option<&RawNumber>,
    bounds: IntBounds,
) -> Result<i64, ValidationError> {
    let value = match raw {
        None => None,
        Some(raw) => coerce_integer(field, raw)?,
    };
    match value {
        None => Ok(bounds.default),
        Some(n) => check_range(field, n, bounds),
    }
}

/// `Ok(None)` for blank text. Accepts surrounding whitespace, a leading
/// `+`, and integral decimals such as `"700.0"`.
fn coerce_integer(field: &str, raw: &RawNumber) -> Result<Option<i64>, ValidationError> {
    match raw {
        RawNumber::Int(n) => Ok(Some(*n)),
        RawNumber::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = t.parse::<i64>() {
                return Ok(Some(n));
            }
            match t.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(ValidationError::new(
                    field,
                    Violation::NotAnInteger {
                        value: t.to_string(),
                    },
                )),
            }
        }
    }
}

fn check_range(field: &str, n: i64, bounds: IntBounds) -> Result<i64, ValidationError> {
    if n < bounds.min {
        return Err(ValidationError::new(
            field,
            Violation::BelowMinimum {
                min: bounds.min,
                actual: n,
            },
        ));
    }
    if n > bounds.max {
        return Err(ValidationError::new(
            field,
            Violation::AboveMaximum {
                max: bounds.max,
                actual: n,
            },
        ));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog(keyword: &str) -> BlogPostInput {
        BlogPostInput {
            keyword: Some(keyword.into()),
            ..Default::default()
        }
    }

    #[test]
    fn blog_defaults_are_applied() {
        let req = validate_blog_post(&blog("Solar Panels"), &GenerationLimits::default())
            .expect("valid");
        assert_eq!(req.keyword, "Solar Panels");
        assert_eq!(req.word_count, 700);
        assert_eq!(req.image_count, 0);
        assert_eq!(req.tone, "friendly and helpful");
        assert_eq!(req.seo_keywords, None);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let input = BlogPostInput {
            word_count: Some(" 1200 ".into()),
            image_count: Some("2".into()),
            ..blog("Solar Panels")
        };
        let req = validate_blog_post(&input, &GenerationLimits::default()).expect("valid");
        assert_eq!(req.word_count, 1200);
        assert_eq!(req.image_count, 2);
    }

    #[test]
    fn integral_decimal_string_is_accepted() {
        let input = BlogPostInput {
            word_count: Some("800.0".into()),
            ..blog("Solar Panels")
        };
        let req = validate_blog_post(&input, &GenerationLimits::default()).expect("valid");
        assert_eq!(req.word_count, 800);
    }

    #[test]
    fn non_numeric_string_is_rejected() {
        let input = BlogPostInput {
            word_count: Some("lots".into()),
            ..blog("Solar Panels")
        };
        let err = validate_blog_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.field, "word_count");
        assert!(matches!(err.violation, Violation::NotAnInteger { .. }));
    }

    #[test]
    fn out_of_range_counts_are_rejected_not_clamped() {
        let input = BlogPostInput {
            image_count: Some(RawNumber::Int(6)),
            ..blog("Solar Panels")
        };
        let err = validate_blog_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.field, "image_count");
        assert_eq!(err.violation, Violation::AboveMaximum { max: 5, actual: 6 });

        let input = BlogPostInput {
            word_count: Some(RawNumber::Int(10)),
            ..blog("Solar Panels")
        };
        let err = validate_blog_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(
            err.violation,
            Violation::BelowMinimum {
                min: 50,
                actual: 10
            }
        );
    }

    #[test]
    fn keyword_length_bounds() {
        let err = validate_blog_post(&blog("ab"), &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.violation, Violation::TooShort { min: 3, actual: 2 });

        let long = "x".repeat(101);
        let err = validate_blog_post(&blog(&long), &GenerationLimits::default()).unwrap_err();
        assert_eq!(
            err.violation,
            Violation::TooLong {
                max: 100,
                actual: 101
            }
        );

        let err = validate_blog_post(&blog("   "), &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.violation, Violation::Required);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Three characters, nine bytes.
        assert!(validate_blog_post(&blog("日本語"), &GenerationLimits::default()).is_ok());
    }

    #[test]
    fn tone_must_be_known() {
        let input = BlogPostInput {
            tone: Some("Professional".into()),
            ..blog("Solar Panels")
        };
        let req = validate_blog_post(&input, &GenerationLimits::default()).expect("valid");
        assert_eq!(req.tone, "professional");

        let input = BlogPostInput {
            tone: Some("grumpy".into()),
            ..blog("Solar Panels")
        };
        let err = validate_blog_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.field, "tone");
        assert!(matches!(err.violation, Violation::NotInSet { .. }));
    }

    #[test]
    fn blank_seo_keywords_become_none() {
        let input = BlogPostInput {
            seo_keywords: Some("   ".into()),
            ..blog("Solar Panels")
        };
        let req = validate_blog_post(&input, &GenerationLimits::default()).expect("valid");
        assert_eq!(req.seo_keywords, None);
    }

    #[test]
    fn configured_bounds_are_honoured() {
        let limits = GenerationLimits {
            blog_word_count: IntBounds::new(50, 2000, 500),
            ..GenerationLimits::default()
        };
        let input = BlogPostInput {
            word_count: Some(RawNumber::Int(2500)),
            ..blog("Solar Panels")
        };
        let err = validate_blog_post(&input, &limits).unwrap_err();
        assert_eq!(
            err.violation,
            Violation::AboveMaximum {
                max: 2000,
                actual: 2500
            }
        );
    }

    #[test]
    fn social_request_normalises() {
        let input = SocialPostInput {
            topic: Some("  Launching our new app  ".into()),
            platform: Some("X".into()),
            post_count: Some("3".into()),
            image_count: Some(RawNumber::Int(1)),
            max_length: Some("".into()),
            ..Default::default()
        };
        let req = validate_social_post(&input, &GenerationLimits::default()).expect("valid");
        assert_eq!(req.topic, "Launching our new app");
        assert_eq!(req.platform, Platform::Twitter);
        assert_eq!(req.post_count, 3);
        assert_eq!(req.image_count, 1);
        assert_eq!(req.max_length, None);
        assert!(req.include_hashtags);
    }

    #[test]
    fn social_platform_is_required_and_enumerated() {
        let input = SocialPostInput {
            topic: Some("Launching our new app".into()),
            ..Default::default()
        };
        let err = validate_social_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.field, "platform");
        assert_eq!(err.violation, Violation::Required);

        let input = SocialPostInput {
            topic: Some("Launching our new app".into()),
            platform: Some("myspace".into()),
            ..Default::default()
        };
        let err = validate_social_post(&input, &GenerationLimits::default()).unwrap_err();
        assert!(matches!(err.violation, Violation::NotInSet { .. }));
    }

    #[test]
    fn social_image_count_has_its_own_bound() {
        let input = SocialPostInput {
            topic: Some("Launching our new app".into()),
            platform: Some("linkedin".into()),
            image_count: Some(RawNumber::Int(4)),
            ..Default::default()
        };
        let err = validate_social_post(&input, &GenerationLimits::default()).unwrap_err();
        assert_eq!(err.field, "image_count");
        assert_eq!(err.violation, Violation::AboveMaximum { max: 3, actual: 4 });
    }

    #[test]
    fn raw_number_deserialises_from_either_shape() {
        let a: RawNumber = serde_json::from_str("5").expect("int");
        let b: RawNumber = serde_json::from_str("\"5\"").expect("string");
        assert_eq!(a, RawNumber::Int(5));
        assert_eq!(b, RawNumber::Text("5".into()));
    }
}
