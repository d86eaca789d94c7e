// Rule-based Rewriter
// Deterministic fallback used when no paraphrase model is available

use super::text_processor::{normalize_text, split_sentences};

/// Normalize, split into sentences, capitalize each one and join with single spaces.
///
/// Only the first character of every sentence is touched. The output is fully
/// deterministic: the same input always yields the same text.
pub fn rewrite(text: &str) -> String {
    let clean = normalize_text(text);
    split_sentences(&clean)
        .iter()
        .map(|s| capitalize_first(s))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
