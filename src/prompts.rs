//! Prompts for every model call the pipeline makes.
//!
//! Keeping them together means a wording change touches exactly one file,
//! and unit tests can inspect a prompt without a live model.
//!
//! Replies that the pipeline parses (blog drafts, social drafts, heading
//! lists) are requested as a single JSON object. Replies used verbatim
//! (image descriptions, SEO rewrites) are requested as plain text.

use crate::pipeline::placeholder;
use crate::request::{BlogPostRequest, Platform, SocialPostRequest};

/// Output-format rules shared by every prompt that produces body text.
pub const PLAIN_TEXT_RULES: &str = r#"FORMATTING RULES
- Write plain text only.
- The ONLY markup allowed is **bold**, and only for a sub-heading that sits on its own line.
- Do NOT use # headings, bullet symbols other than "-", links, tables, HTML tags, or code fences.
- Separate paragraphs with one blank line."#;

/// What an image should depict, independent of where it sits in the text.
#[derive(Debug, Clone)]
pub struct ImageSubject {
    /// Main topic or keyword.
    pub topic: String,
    /// Secondary keywords, if any.
    pub keywords: Option<String>,
    pub tone: String,
    /// Target platform for social posts.
    pub platform: Option<Platform>,
}

impl ImageSubject {
    pub fn for_blog(req: &BlogPostRequest) -> Self {
        Self {
            topic: req.keyword.clone(),
            keywords: req.related_keywords.clone(),
            tone: req.tone.clone(),
            platform: None,
        }
    }

    pub fn for_social(req: &SocialPostRequest) -> Self {
        Self {
            topic: req.topic.clone(),
            keywords: None,
            tone: req.tone.clone(),
            platform: Some(req.platform),
        }
    }
}

/// Instruction block asking for exactly `count` numbered placeholder tokens,
/// or forbidding them when `count == 0`.
pub fn placeholder_instruction(count: usize) -> String {
    if count == 0 {
        return "Do NOT include any image placeholders.".to_string();
    }
    let tokens: Vec<String> = (1..=count).map(placeholder::token).collect();
    format!(
        "IMAGES\n\
         - Insert exactly {count} image placeholder token(s) into the content: {}.\n\
         - Number them sequentially starting at 1 and use each token exactly once.\n\
         - Put each token on its own line where an illustration fits the surrounding text.\n\
         - Copy the tokens exactly, including the square brackets.",
        tokens.join(", ")
    )
}

/// Prompt for a blog post. Asks for `{"title","content"}`, or just
/// `{"content"}` when the caller supplied a title.
pub fn blog_post_prompt(req: &BlogPostRequest) -> String {
    let mut p = String::with_capacity(2048);
    p.push_str("You are an expert blog writer and content marketer.\n\n");
    p.push_str(&format!("Write a blog post about: {}\n", req.keyword));
    if let Some(ref related) = req.related_keywords {
        p.push_str(&format!("Related keywords to cover: {related}\n"));
    }
    p.push_str(&format!("Tone: {}\n", req.tone));
    p.push_str(&format!("Target length: about {} words\n", req.word_count));
    if let Some(ref title) = req.title {
        p.push_str(&format!("The post's title is fixed: \"{title}\". Do not write a title.\n"));
    }
    if let Some(ref extra) = req.instructions {
        p.push_str(&format!("Additional instructions: {extra}\n"));
    }
    p.push('\n');
    p.push_str(PLAIN_TEXT_RULES);
    p.push_str("\n\n");
    p.push_str(&placeholder_instruction(req.image_count));
    p.push_str("\n\nOUTPUT\n");
    if req.title.is_some() {
        p.push_str(
            "Respond with ONLY a JSON object of the form {\"content\": \"...\"}. \
             No commentary before or after it.",
        );
    } else {
        p.push_str(
            "Respond with ONLY a JSON object of the form {\"title\": \"...\", \"content\": \"...\"}. \
             The title is plain text without markup. No commentary before or after the object.",
        );
    }
    p
}

/// Prompt for one social post of a batch (`post_number` is 1-based).
pub fn social_post_prompt(req: &SocialPostRequest, post_number: usize) -> String {
    let limit = req
        .max_length
        .unwrap_or_else(|| req.platform.native_char_limit());
    let mut p = String::with_capacity(1536);
    p.push_str("You are a social media copywriter.\n\n");
    p.push_str(&format!(
        "Write a {} post about: {}\n",
        req.platform.label(),
        req.topic
    ));
    p.push_str(&format!("Tone: {}\n", req.tone));
    p.push_str(&format!("Keep the post under {limit} characters.\n"));
    if req.post_count > 1 {
        p.push_str(&format!(
            "This is variation {post_number} of {}; make it distinct from the others \
             in angle and wording.\n",
            req.post_count
        ));
    }
    if let Some(ref extra) = req.instructions {
        p.push_str(&format!("Additional instructions: {extra}\n"));
    }
    p.push('\n');
    p.push_str(PLAIN_TEXT_RULES);
    p.push_str("\n\n");
    p.push_str(&placeholder_instruction(req.image_count));
    p.push_str("\n\nOUTPUT\n");
    if req.include_hashtags {
        p.push_str(
            "Respond with ONLY a JSON object of the form \
             {\"content\": \"...\", \"hashtags\": [\"#example\", ...]}. \
             Put hashtags in the list, not in the content.",
        );
    } else {
        p.push_str(
            "Respond with ONLY a JSON object of the form {\"content\": \"...\"}. \
             Do not use hashtags.",
        );
    }
    p
}

/// Prompt asking the text model to describe one image for synthesis.
pub fn image_prompt_request(subject: &ImageSubject, context: &str) -> String {
    let mut p = String::with_capacity(1024);
    p.push_str(
        "Describe a single image to illustrate a piece of marketing content. \
         The description will be sent to an image generator.\n\n",
    );
    p.push_str(&format!("Topic: {}\n", subject.topic));
    if let Some(ref kw) = subject.keywords {
        p.push_str(&format!("Keywords: {kw}\n"));
    }
    p.push_str(&format!("Tone: {}\n", subject.tone));
    if let Some(platform) = subject.platform {
        p.push_str(&format!("Platform: {}\n", platform.label()));
    }
    if context.trim().is_empty() {
        p.push_str("\nNo surrounding text is available; illustrate the topic as a whole.\n");
    } else {
        p.push_str(&format!(
            "\nThe image appears next to this text:\n\"\"\"{}\"\"\"\n",
            context.trim()
        ));
    }
    p.push_str(
        "\nReply with ONLY the image description: one paragraph, at most 60 words, \
         describing subject, setting, style and lighting. No text or lettering in the image.",
    );
    p
}

/// Prompt asking for a keyword-integrating rewrite of `content`.
pub fn seo_rewrite_prompt(content: &str, keywords: &str) -> String {
    format!(
        "You are an SEO editor. Rewrite the following content so it naturally includes these \
         keywords: {keywords}\n\n\
         - Keep the meaning, the paragraph structure and the **bold** sub-headings.\n\
         - Do not stuff keywords; each should read naturally.\n\
         - Keep every token of the form [IMAGE_PLACEHOLDER_n] exactly as it is, in the same place.\n\
         - Reply with ONLY the rewritten content, no commentary.\n\n\
         {PLAIN_TEXT_RULES}\n\n\
         CONTENT\n\"\"\"\n{content}\n\"\"\""
    )
}

/// Prompt asking for heading suggestions.
pub fn headings_prompt(topic: &str) -> String {
    format!(
        "You are an expert blog editor. Suggest 5 to 8 section headings for a blog post \
         about: {topic}\n\n\
         Headings are plain text, without numbering or markup, in reading order.\n\
         Respond with ONLY a JSON object of the form {{\"headings\": [\"...\", ...]}}."
    )
}
