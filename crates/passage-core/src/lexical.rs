//! Keyword-overlap scoring for small corpora.
//!
//! The query is reduced to its distinct lowercase word tokens of three or
//! more characters. A chunk scores one point for every token that occurs
//! anywhere inside it as a case-insensitive substring, so `"wand"` also
//! matches `"wand-care"` and `"cat"` matches `"category"`. Repeated
//! occurrences within a chunk do not add to the score.

use std::sync::LazyLock;

use regex::Regex;

use crate::retrieve::{finalize_hits, Hit, Retriever};

/// Shortest query token that takes part in scoring.
pub const MIN_TOKEN_CHARS: usize = 3;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Extract distinct lowercase query tokens of at least [`MIN_TOKEN_CHARS`]
/// characters, in first-seen order.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for m in WORD_RE.find_iter(&lowered) {
        let word = m.as_str();
        if word.chars().count() >= MIN_TOKEN_CHARS && !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

/// Lexical retriever borrowing the chunk sequence it scores.
pub struct LexicalScorer<'a> {
    chunks: &'a [String],
}

impl<'a> LexicalScorer<'a> {
    pub fn new(chunks: &'a [String]) -> Self {
        Self { chunks }
    }

    /// Number of distinct query tokens present in `chunk`.
    pub fn score(tokens: &[String], chunk: &str) -> usize {
        let lowered = chunk.to_lowercase();
        tokens
            .iter()
            .filter(|t| lowered.contains(t.as_str()))
            .count()
    }
}

impl Retriever for LexicalScorer<'_> {
    fn rank(&self, query: &str, top_k: usize) -> Vec<Hit> {
        let tokens = tokenize_query(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let hits = self
            .chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| Hit {
                index,
                score: Self::score(&tokens, chunk) as f64,
            })
            .collect();

        finalize_hits(hits, top_k)
    }
}
