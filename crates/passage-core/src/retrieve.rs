//! Retrieval strategy abstraction.
//!
//! Both scoring backends implement [`Retriever`]: given a query they
//! return ranked [`Hit`]s pointing back into the chunk sequence. Which
//! backend runs is decided by [`select_strategy`] from the corpus size
//! alone.
//!
//! | Corpus size (chars) | Strategy |
//! |---------------------|----------|
//! | `<= 5000` | [`Strategy::Lexical`] |
//! | `> 5000` | [`Strategy::Vector`] |

use serde::Serialize;

/// Corpus size above which TF-IDF vector retrieval replaces keyword overlap.
pub const VECTOR_THRESHOLD_CHARS: usize = 5000;

/// Number of chunks returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 3;

/// A ranked reference to one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    /// Position in the chunk sequence.
    pub index: usize,
    /// Strategy-specific relevance; always strictly positive.
    pub score: f64,
}

/// Ranks chunks against a free-text query.
///
/// Implementations must return at most `top_k` hits, ordered by score
/// descending with ties kept in ascending chunk order, and must omit
/// chunks with a non-positive score.
pub trait Retriever {
    fn rank(&self, query: &str, top_k: usize) -> Vec<Hit>;
}

/// Which scoring path a query takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Lexical,
    Vector,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Lexical => "lexical",
            Strategy::Vector => "vector",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the strategy for a corpus of `total_chars` characters.
pub fn select_strategy(total_chars: usize) -> Strategy {
    if total_chars > VECTOR_THRESHOLD_CHARS {
        Strategy::Vector
    } else {
        Strategy::Lexical
    }
}

/// Sort hits by score descending (stable, so ties stay in chunk order),
/// drop non-positive scores, and keep the best `top_k`.
pub(crate) fn finalize_hits(mut hits: Vec<Hit>, top_k: usize) -> Vec<Hit> {
    hits.retain(|h| h.score > 0.0);
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(top_k);
    hits
}
