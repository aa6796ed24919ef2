//! Locating the JSON payload inside free-form model output.
//!
//! Models wrap JSON in markdown fences, add prose before or after it, or drop
//! the fences altogether. Extraction tries, in order: a fence tagged `json`,
//! any other fence whose content looks like JSON, then a bracket scan over the
//! raw text.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?is)```json\b\s*(.*?)```").unwrap();
    static ref ANY_FENCE: Regex = Regex::new(r"(?s)```[^\n`]*\n(.*?)```").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("AI response did not contain expected JSON format")]
    NoJsonFound,
}

/// Return the substring of `raw` believed to be JSON.
pub fn extract_json(raw: &str) -> Result<&str, ExtractionError> {
    if let Some(content) = JSON_FENCE.captures(raw).and_then(|c| c.get(1)) {
        return Ok(content.as_str().trim());
    }

    for captures in ANY_FENCE.captures_iter(raw) {
        if let Some(content) = captures.get(1) {
            let trimmed = content.as_str().trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                return Ok(trimmed);
            }
        }
    }

    scan_brackets(raw).ok_or(ExtractionError::NoJsonFound)
}

fn scan_brackets(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let rest = &text[start..];

    let end = if rest.starts_with('{') {
        rest.rfind('}')?
    } else {
        matching_close_bracket(rest).or_else(|| rest.rfind(']'))?
    };

    Some(&rest[..=end])
}

/// Byte offset of the `]` closing the `[` at the start of `text`.
/// Brackets inside JSON strings are ignored.
fn matching_close_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}
