//! Image placeholder tokens: `[IMAGE_PLACEHOLDER_<n>]`.
//!
//! The text model marks where each image belongs by emitting numbered
//! tokens (`<n>` is 1-based). This module parses them in a single regex
//! pass into `{index, offset}` records, cuts context windows around them,
//! and removes them once the images are resolved.
//!
//! The model is not trusted to follow instructions: tokens may be missing,
//! duplicated, or numbered out of range. Missing tokens simply have no
//! offset; duplicates and strays are removed along with the rest.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[IMAGE_PLACEHOLDER_(\d+)\]").unwrap());

/// One token occurrence in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderToken {
    /// 1-based image index. Unparseable (overflowing) numbers become `usize::MAX`.
    pub index: usize,
    /// Byte offset of the opening `[`.
    pub offset: usize,
    /// Byte length of the whole token.
    pub len: usize,
}

impl PlaceholderToken {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Text with all placeholder tokens removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    /// `anchors[i - 1]` is the byte offset in `text` where the first token
    /// for index `i` stood, or `None` if the model never emitted it.
    pub anchors: Vec<Option<usize>>,
}

/// The literal token for `index`.
pub fn token(index: usize) -> String {
    format!("[IMAGE_PLACEHOLDER_{index}]")
}

/// All token occurrences, in text order.
pub fn parse(text: &str) -> Vec<PlaceholderToken> {
    RE_PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let index = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            Some(PlaceholderToken {
                index,
                offset: whole.start(),
                len: whole.len(),
            })
        })
        .collect()
}

/// First occurrence of `index`, if the model emitted it.
pub fn locate(tokens: &[PlaceholderToken], index: usize) -> Option<&PlaceholderToken> {
    tokens.iter().find(|t| t.index == index)
}

/// Does `text` contain any placeholder token at all?
pub fn contains_any(text: &str) -> bool {
    RE_PLACEHOLDER.is_match(text)
}

/// Up to `radius` characters either side of `token`, with any other
/// tokens removed and whitespace collapsed. Used only as image context.
pub fn context_window(text: &str, token: &PlaceholderToken, radius: usize) -> String {
    if radius == 0 {
        return String::new();
    }
    let before = &text[..token.offset];
    let after = &text[token.end()..];

    let skip = before.chars().count().saturating_sub(radius);
    let mut window: String = before.chars().skip(skip).collect();
    window.push(' ');
    window.extend(after.chars().take(radius));

    let window = RE_PLACEHOLDER.replace_all(&window, " ");
    window.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every placeholder token, recording where indices `1..=count` stood.
///
/// A token alone on its line takes its line with it (and one adjoining
/// blank line, so paragraphs stay separated by exactly one blank line). A
/// token opening a line of text takes the spaces after it; an inline token
/// between two spaces leaves a single space. Strays (out of
/// range, or any token when `count == 0`) are removed too.
pub fn strip(text: &str, count: usize) -> Resolved {
    let mut out = String::with_capacity(text.len());
    let mut anchors = vec![None; count];
    let mut cursor = 0;

    for t in parse(text) {
        out.push_str(&text[cursor..t.offset]);
        let mut end = t.end();

        let at_line_start = out.is_empty() || out.ends_with('\n');
        if at_line_start {
            let rest = &text[end..];
            let trimmed = rest.trim_start_matches([' ', '\t']);
            end += rest.len() - trimmed.len();
            if trimmed.is_empty() || trimmed.starts_with('\n') {
                if trimmed.starts_with('\n') {
                    end += 1;
                }
                let paragraph_gap = out.is_empty() || out.ends_with("\n\n");
                if paragraph_gap && text[end..].starts_with('\n') {
                    end += 1;
                }
            }
        } else if out.ends_with(' ') && text[end..].starts_with(' ') {
            end += 1;
        }

        if (1..=count).contains(&t.index) && anchors[t.index - 1].is_none() {
            anchors[t.index - 1] = Some(out.len());
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    for anchor in anchors.iter_mut().flatten() {
        *anchor = (*anchor).min(trimmed_len);
    }

    Resolved { text: out, anchors }
}
