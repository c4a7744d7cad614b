//! Plain-text export of generated results.
//!
//! Output is what a reader would copy into a plain editor: title, blank
//! line, body. `**` markers and any leftover placeholder tokens are removed.

use crate::output::{GenerationResult, PostBatch, SocialPostResult};
use crate::pipeline::placeholder;
use crate::pipeline::postprocess::strip_bold;

/// Render a blog post as plain text.
pub fn render_blog_text(result: &GenerationResult) -> String {
    let mut out = String::with_capacity(result.title.len() + result.content.len() + 4);
    out.push_str(&plain_body(&result.title));
    out.push_str("\n\n");
    out.push_str(&plain_body(&result.content));
    out.push('\n');
    out
}

/// Render one social post as plain text, hashtags on the last line.
pub fn render_social_text(post: &SocialPostResult) -> String {
    let mut out = plain_body(&post.content);
    if !post.hashtags.is_empty() {
        out.push_str("\n\n");
        out.push_str(&post.hashtags.join(" "));
    }
    out.push('\n');
    out
}

/// Render a batch, posts separated by a rule.
pub fn render_batch_text(batch: &PostBatch) -> String {
    batch
        .posts
        .iter()
        .map(|p| format!("Post {}\n\n{}", p.position, render_social_text(p)))
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

fn plain_body(content: &str) -> String {
    let stripped = placeholder::strip(content, 0).text;
    strip_bold(&stripped).trim().to_string()
}
