//! Answer sanitization
//!
//! Questionnaire answers are free text typed by the client. Before anything
//! is persisted, HTML tags are stripped and each answer is capped at
//! `MAX_ANSWER_LEN` characters.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a single answer, in characters.
pub const MAX_ANSWER_LEN: usize = 5000;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Strip HTML tags and cap the answer length.
pub fn sanitize_answer(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    stripped.chars().take(MAX_ANSWER_LEN).collect()
}

/// Sanitize a whole answer array, preserving order and blanks.
pub fn sanitize_answers(raw: &[String]) -> Vec<String> {
    raw.iter().map(|a| sanitize_answer(a)).collect()
}
