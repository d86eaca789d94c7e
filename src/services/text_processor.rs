// Text Processing Service
// Whitespace cleanup, shorthand expansion and sentence splitting

use regex::Regex;
use std::sync::OnceLock;

/// Shorthand table, applied in declaration order (whole word, case-insensitive)
const SHORTHANDS: &[(&str, &str)] = &[
    ("u", "you"),
    ("ur", "your"),
    ("idk", "I don't know"),
    ("thx", "thanks"),
    ("pls", "please"),
    ("omg", "oh my God"),
    ("lol", "laughing out loud"),
];

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static SHORTHAND_RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
static PERIOD_GLUE_RE: OnceLock<Regex> = OnceLock::new();
static SENTENCE_END_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn shorthand_res() -> &'static [(Regex, &'static str)] {
    SHORTHAND_RES.get_or_init(|| {
        SHORTHANDS
            .iter()
            .map(|(word, repl)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).unwrap();
                (re, *repl)
            })
            .collect()
    })
}

fn period_glue_re() -> &'static Regex {
    // Rust regex has no lookahead, so the letter is captured and written back
    PERIOD_GLUE_RE.get_or_init(|| Regex::new(r"\.([A-Za-z])").unwrap())
}

fn sentence_end_re() -> &'static Regex {
    SENTENCE_END_RE.get_or_init(|| Regex::new(r"[.!?]\s+").unwrap())
}

/// Normalize raw input: collapse whitespace, expand shorthand, fix period spacing.
///
/// Never fails; the empty string maps to itself. Applying it twice gives the
/// same result as applying it once.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = whitespace_re().replace_all(text, " ").trim().to_string();

    for (re, repl) in shorthand_res() {
        // NoExpand: replacements are literal text, not `$` templates
        s = re.replace_all(&s, regex::NoExpand(*repl)).into_owned();
    }

    period_glue_re().replace_all(&s, ". $1").into_owned()
}

/// Split text into sentence chunks.
///
/// A boundary is terminal punctuation (`.`, `!`, `?`) followed by whitespace.
/// The punctuation stays with the left chunk and the whitespace is dropped.
/// Chunks are trimmed and empty ones are skipped.
pub fn split_sentences(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }

    // Rust regex doesn't support lookbehind: cut right after the punctuation char
    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    for m in sentence_end_re().find_iter(text) {
        // terminal punctuation is always a single ASCII byte
        chunks.push(&text[cursor..m.start() + 1]);
        cursor = m.end();
    }
    chunks.push(&text[cursor..]);

    chunks
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}
