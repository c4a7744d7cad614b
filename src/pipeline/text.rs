//! Text stage: prompt the text model and parse its structured reply.
//!
//! Replies are requested as JSON objects but arrive in whatever shape the
//! model felt like: fenced, surrounded by chatter, with hashtags as a list
//! or as one string. Everything is normalised here so later stages only
//! ever see clean [`BlogDraft`] / [`SocialDraft`] values.

use crate::error::{ContentGenError, GenerationFailure};
use crate::pipeline::placeholder;
use crate::pipeline::postprocess::{clean_body, clean_title, extract_json_object};
use crate::prompts;
use crate::provider::TextModel;
use crate::request::{BlogPostRequest, SocialPostRequest};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Title and token-bearing content of a blog post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    /// Cleaned content, still carrying `[IMAGE_PLACEHOLDER_n]` tokens.
    pub content: String,
}

/// Content and hashtags of one social post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialDraft {
    /// Cleaned content, still carrying `[IMAGE_PLACEHOLDER_n]` tokens.
    pub content: String,
    pub hashtags: Vec<String>,
}

/// Hashtags as models actually send them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HashtagField {
    List(Vec<String>),
    Text(String),
}

/// Generate the blog draft for `req`.
///
/// A caller-supplied title is used verbatim and exempt from the title check.
pub async fn generate_blog_draft(
    model: &dyn TextModel,
    req: &BlogPostRequest,
) -> Result<BlogDraft, ContentGenError> {
    let prompt = prompts::blog_post_prompt(req);
    debug!("Blog prompt: {} chars", prompt.len());

    let fields = complete_object(model, &prompt).await?;

    let content = string_field(&fields, "content")
        .map(clean_body)
        .unwrap_or_default();
    let title = match req.title {
        Some(ref supplied) => supplied.clone(),
        None => string_field(&fields, "title")
            .map(clean_title)
            .unwrap_or_default(),
    };

    let title_missing = req.title.is_none() && title.is_empty();
    let content_missing = !has_text(&content);
    let reason = match (title_missing, content_missing) {
        (true, true) => Some(GenerationFailure::BothMissing),
        (true, false) => Some(GenerationFailure::TitleMissing),
        (false, true) => Some(GenerationFailure::ContentMissing),
        (false, false) => None,
    };
    if let Some(reason) = reason {
        return Err(ContentGenError::Generation {
            reason,
            detail: None,
        });
    }

    Ok(BlogDraft { title, content })
}

/// Generate post `post_number` (1-based) of a social batch.
pub async fn generate_social_draft(
    model: &dyn TextModel,
    req: &SocialPostRequest,
    post_number: usize,
) -> Result<SocialDraft, ContentGenError> {
    let prompt = prompts::social_post_prompt(req, post_number);
    debug!("Social prompt #{post_number}: {} chars", prompt.len());

    let fields = complete_object(model, &prompt).await?;

    let content = string_field(&fields, "content")
        .map(clean_body)
        .unwrap_or_default();
    if !has_text(&content) {
        return Err(ContentGenError::Generation {
            reason: GenerationFailure::ContentMissing,
            detail: Some(format!("post {post_number}")),
        });
    }

    let hashtags = if req.include_hashtags {
        fields
            .get("hashtags")
            .cloned()
            .and_then(|v| serde_json::from_value::<HashtagField>(v).ok())
            .map(normalize_hashtags)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(SocialDraft { content, hashtags })
}

/// Ask for heading suggestions for `topic`. An empty list is `NoOutput`.
pub async fn generate_headings(
    model: &dyn TextModel,
    topic: &str,
) -> Result<Vec<String>, ContentGenError> {
    let fields = complete_object(model, &prompts::headings_prompt(topic)).await?;

    let mut headings: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = fields.get("headings") {
        for item in items.iter().filter_map(Value::as_str) {
            let h = clean_title(item);
            if !h.is_empty() && !headings.contains(&h) {
                headings.push(h);
            }
        }
    }

    if headings.is_empty() {
        return Err(ContentGenError::generation(
            GenerationFailure::NoOutput,
            "no headings in reply",
        ));
    }
    Ok(headings)
}

/// Normalise hashtags: leading `#`, no blanks, no placeholder tokens, no
/// duplicates (case-insensitive), original order kept. A string is split on
/// whitespace and commas.
fn normalize_hashtags(field: HashtagField) -> Vec<String> {
    let raw: Vec<String> = match field {
        HashtagField::List(items) => items
            .iter()
            .flat_map(|s| split_tags(s))
            .collect(),
        HashtagField::Text(s) => split_tags(&s),
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let body = tag.trim_start_matches('#').trim();
        if body.is_empty() || placeholder::contains_any(body) {
            continue;
        }
        let tag = format!("#{body}");
        let folded = tag.to_lowercase();
        if !out.iter().any(|t| t.to_lowercase() == folded) {
            out.push(tag);
        }
    }
    out
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

// ── Reply parsing ────────────────────────────────────────────────────────

/// Call the model and parse its reply as a JSON object.
///
/// A failed call, an empty reply, or a reply without a parseable object
/// are all `NoOutput`.
async fn complete_object(
    model: &dyn TextModel,
    prompt: &str,
) -> Result<Map<String, Value>, ContentGenError> {
    let reply = model
        .complete(prompt)
        .await
        .map_err(|e| ContentGenError::generation(GenerationFailure::NoOutput, e.to_string()))?;

    if reply.trim().is_empty() {
        return Err(ContentGenError::generation(
            GenerationFailure::NoOutput,
            "empty reply",
        ));
    }

    let json = extract_json_object(&reply).ok_or_else(|| {
        ContentGenError::generation(GenerationFailure::NoOutput, "reply is not a JSON object")
    })?;

    match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ContentGenError::generation(
            GenerationFailure::NoOutput,
            "reply is not a JSON object",
        )),
        Err(e) => Err(ContentGenError::generation(
            GenerationFailure::NoOutput,
            format!("unparseable reply: {e}"),
        )),
    }
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// True when `content` has something left once placeholders are removed.
fn has_text(content: &str) -> bool {
    !placeholder::strip(content, 0).text.trim().is_empty()
}
