//! Trailing tag tokenizer.
//!
//! Only the whitespace-separated run of tags at the very end of a row is
//! tokenized; `#words` inside prose are left alone. Spans are reported in
//! character offsets of the original text.

use crate::model::tag::TagToken;
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(#\w+(?:/\w+)*)$").expect("valid trailing tag regex")
});
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(#\w+(?:/\w+)*)").expect("valid tag regex"));

/// Extracts the trailing run of tags, left to right.
///
/// `"Do something #this #that/nested"` yields `#this` and `#that/nested`;
/// `"Review the #draft document"` yields nothing.
pub fn trailing_tokens(text: &str) -> Vec<TagToken> {
    let mut tokens = Vec::new();
    let mut end = text.trim_end().len();

    while end > 0 {
        let Some(caps) = TRAILING_TAG_RE.captures(&text[..end]) else {
            break;
        };
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        tokens.push(token_from_bytes(text, tag.start(), tag.end()));
        end = text[..whole.start()].trim_end().len();
    }

    tokens.reverse();
    tokens
}

/// Finds the tag-shaped token whose span touches `caret`.
///
/// Unlike [`trailing_tokens`], this looks at every whitespace-delimited
/// `#tag` in the row. `caret` is a character offset; a caret sitting right
/// after the last character still resolves to that token.
pub fn tag_at(text: &str, caret: usize) -> Option<TagToken> {
    TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter(|tag| {
            text[tag.end()..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace)
        })
        .map(|tag| token_from_bytes(text, tag.start(), tag.end()))
        .find(|token| token.contains_offset(caret))
}

fn token_from_bytes(text: &str, byte_start: usize, byte_end: usize) -> TagToken {
    let start = text[..byte_start].chars().count();
    let raw_tag = text[byte_start..byte_end].to_string();
    let end = start + raw_tag.chars().count();
    TagToken {
        raw_tag,
        start,
        end,
    }
}
