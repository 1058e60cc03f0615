//! Naive extractive summarization: keep the first few sentences.

use std::sync::LazyLock;

use regex::Regex;

use crate::Snippet;

pub const DEFAULT_MAX_SENTENCES: usize = 5;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

/// Return the first `max_sentences` sentences of `text`, joined by single
/// spaces.  A sentence ends at `.`, `!` or `?` followed by whitespace.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(text) {
        if sentences.len() == max_sentences {
            break;
        }
        // The terminator is a single ASCII byte and stays with its sentence.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if sentences.len() < max_sentences && start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences.join(" ")
}

/// Join the non-empty snippet bodies into one corpus, separated by blank
/// lines.
pub fn snippet_corpus(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .map(|s| s.snippet.as_str())
        .filter(|body| !body.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
