//! Post-processing: deterministic cleanup of model-generated text.
//!
//! Prompts ask for plain text with `**bold**` sub-headings only, but models
//! drift: they wrap replies in code fences, fall back to `#` headings, emit
//! HTML, invent markdown image links, or pad with invisible characters.
//! The rules here repair that without touching wording. Each rule is a pure
//! `&str -> String` pass and is tested on its own.
//!
//! None of the body rules alter `[IMAGE_PLACEHOLDER_n]` tokens; they are
//! removed later by [`crate::pipeline::placeholder::strip`] once images are
//! resolved. Titles never carry an image, so [`clean_title`] drops them.

use crate::pipeline::placeholder;
use once_cell::sync::Lazy;
use regex::Regex;

/// Clean body text (blog content, social post content, SEO rewrites).
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Rewrite `#` headings as `**bold**` lines
/// 5. Drop markdown image links, unwrap ordinary links to their text
/// 6. Strip HTML tags (`<br>` becomes a line break)
/// 7. Normalise bullet symbols to `-`
/// 8. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 9. Collapse runs of blank lines to one
/// 10. Trim the whole text
pub fn clean_body(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = headings_to_bold(&s);
    let s = remove_links(&s);
    let s = strip_html(&s);
    let s = normalise_bullets(&s);
    let s = remove_invisible_chars(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Clean a title: one line, no markup, no placeholder tokens, no wrapping
/// quotes.
pub fn clean_title(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = placeholder::strip(&s, 0).text;
    let s = remove_links(&s);
    let s = strip_html(&s);
    let s = RE_HEADING_MARK.replace(s.trim(), "");
    let s = s.replace("**", "").replace('`', "");
    let s = collapse_inline_whitespace(&s);
    strip_wrapping_quotes(&s).to_string()
}

/// Clean an image description before it is sent for synthesis.
pub fn clean_image_prompt(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = remove_invisible_chars(&s);
    let s = RE_DESCRIPTION_LABEL.replace(s.trim(), "");
    let s = s.replace("**", "");
    let s = collapse_inline_whitespace(&s);
    strip_wrapping_quotes(&s).to_string()
}

/// Remove `**` markers, leaving the emphasised text.
pub fn strip_bold(input: &str) -> String {
    RE_BOLD.replace_all(input, "$1").to_string()
}

/// Extract the outermost `{...}` object from a model reply.
///
/// Models often surround JSON with prose or fences despite being told not
/// to. Returns `None` when there is no brace pair.
pub fn extract_json_object(reply: &str) -> Option<String> {
    let s = strip_code_fences(reply);
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    Some(s[start..=end].to_string())
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap()
});

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Headings to bold ─────────────────────────────────────────────────

static RE_HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.+?)[ \t#]*$").unwrap());

static RE_HEADING_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+").unwrap());

fn headings_to_bold(input: &str) -> String {
    RE_HEADING_LINE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let text = caps[1].replace("**", "");
            format!("**{}**", text.trim())
        })
        .to_string()
}

// ── Rule 5: Links ────────────────────────────────────────────────────────────
//
// Image URLs come from the image stage, never from the text model, so any
// `![alt](url)` in a reply is invented and goes entirely. Ordinary links
// keep their text.

static RE_IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());

fn remove_links(input: &str) -> String {
    let s = RE_IMAGE_LINK.replace_all(input, "");
    RE_LINK.replace_all(&s, "$1").to_string()
}

// ── Rule 6: Strip HTML ───────────────────────────────────────────────────────

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9]*[^<>]*>").unwrap());

fn strip_html(input: &str) -> String {
    let s = RE_BR.replace_all(input, "\n");
    RE_TAG.replace_all(&s, "").to_string()
}

// ── Rule 7: Bullets ──────────────────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[*•+][ \t]+").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "$1- ").to_string()
}

// ── Rule 8: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 9: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Single-line helpers ──────────────────────────────────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

static RE_DESCRIPTION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(image\s+)?(description|prompt)\s*:\s*").unwrap());

fn collapse_inline_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_wrapping_quotes(input: &str) -> &str {
    let pairs = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];
    for (open, close) in pairs {
        if let Some(inner) = input
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    input
}

// ── Tests ────────────────────────────────────────────────────────────────────
