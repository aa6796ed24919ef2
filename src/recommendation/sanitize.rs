//! Cleaning of untrusted free text before it reaches a prompt.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FORBIDDEN_CHARS: Regex = Regex::new(r"[<>{}\[\]\\/]").unwrap();
}

/// Returned in place of any input that looks like a prompt-injection attempt.
pub const INVALID_INPUT: &str = "Invalid input";

pub const DEFAULT_MAX_INPUT_LENGTH: usize = 250;

/// Lower-case phrases; any occurrence discards the whole input.
pub const DEFAULT_INJECTION_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous",
    "ignore the above",
    "disregard previous",
    "disregard all previous",
    "forget previous",
    "forget your instructions",
    "system prompt",
    "act as",
    "you are now",
    "pretend to be",
    "roleplay as",
    "new instructions",
    "override instructions",
    "jailbreak",
];

#[derive(Debug, Clone)]
pub struct InputSanitizer {
    max_length: usize,
    injection_phrases: Vec<String>,
}

impl Default for InputSanitizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_INPUT_LENGTH,
            DEFAULT_INJECTION_PHRASES.iter().map(|p| p.to_string()),
        )
    }
}

impl InputSanitizer {
    pub fn new<I, S>(max_length: usize, injection_phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            max_length,
            injection_phrases: injection_phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Trim, bound to `max_length` characters and drop `< > { } [ ] \ /`.
    ///
    /// If the input contains a known injection phrase, either as given or once
    /// cleaned, the whole of it is replaced by [`INVALID_INPUT`].
    pub fn sanitize(&self, input: Option<&str>) -> String {
        let Some(input) = input else {
            return String::new();
        };

        let truncated: String = input.trim().chars().take(self.max_length).collect();
        let cleaned = FORBIDDEN_CHARS
            .replace_all(&truncated, "")
            .trim()
            .to_string();

        if self.contains_injection(input) || self.contains_injection(&cleaned) {
            return INVALID_INPUT.to_string();
        }

        cleaned
    }

    /// Sanitize an optional field, mapping empty results to None.
    pub fn sanitize_field(&self, input: Option<&str>) -> Option<String> {
        let sanitized = self.sanitize(input);
        if sanitized.is_empty() {
            None
        } else {
            Some(sanitized)
        }
    }

    fn contains_injection(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.injection_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}
