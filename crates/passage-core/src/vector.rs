//! TF-IDF vector index for large corpora.
//!
//! The term-weighting model is fit exclusively on the chunks it indexes:
//! vocabulary and document frequencies are corpus-local. Each chunk
//! becomes an L2-normalized sparse vector; a query is projected into the
//! same space and compared with cosine similarity.
//!
//! # Weighting
//!
//! - Tokens: lowercase runs of two or more word characters.
//! - `tf(t, d)`: raw count of `t` in `d`.
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1` (smoothed).
//! - Vectors are L2-normalized after weighting.
//!
//! Query terms outside the fitted vocabulary carry no weight, so a query
//! made only of unseen words matches nothing. That is expected, not an
//! error.
//!
//! # Example
//!
//! ```rust
//! use passage_core::retrieve::Retriever;
//! use passage_core::vector::VectorIndex;
//!
//! let chunks = vec![
//!     "The owl delivered a letter.".to_string(),
//!     "Quidditch practice ran late.".to_string(),
//! ];
//! let index = VectorIndex::build(&chunks);
//! let hits = index.rank("owl letter", 3);
//! assert_eq!(hits[0].index, 0);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::retrieve::{finalize_hits, Hit, Retriever};

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Sparse weight vector: `(term id, weight)` pairs sorted by term id.
pub type SparseVector = Vec<(usize, f64)>;

/// Lowercase document tokens of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Vocabulary and inverse document frequencies fit on one chunk sequence.
#[derive(Debug, Clone, Default)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Fit the vocabulary and IDF weights on `documents`.
    pub fn fit(documents: &[String]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen: Vec<usize> = Vec::new();
            for term in tokenize(doc) {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next_id);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                seen.push(id);
            }
            seen.sort_unstable();
            seen.dedup();
            for id in seen {
                doc_freq[id] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Project `text` into the fitted space. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in tokenize(text) {
            if let Some(&id) = self.vocabulary.get(&term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        vector.sort_unstable_by_key(|&(id, _)| id);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > f64::EPSILON {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity between two sparse vectors sorted by term id.
///
/// Returns `0.0` when either vector has zero magnitude.
pub fn cosine_similarity(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    let norm_a = a.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom < f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Fitted model plus one weight vector per chunk.
///
/// An index built from an empty chunk sequence is uninitialized and
/// answers every query with no hits.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    model: TfidfModel,
    vectors: Vec<SparseVector>,
    initialized: bool,
}

impl VectorIndex {
    pub fn build(chunks: &[String]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }

        let model = TfidfModel::fit(chunks);
        let vectors = chunks.iter().map(|c| model.transform(c)).collect();
        tracing::debug!(
            chunks = chunks.len(),
            vocabulary = model.vocabulary_len(),
            "built tf-idf index"
        );

        Self {
            model,
            vectors,
            initialized: true,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.model.vocabulary_len()
    }
}

impl Retriever for VectorIndex {
    fn rank(&self, query: &str, top_k: usize) -> Vec<Hit> {
        if !self.initialized || self.vectors.is_empty() {
            return Vec::new();
        }

        let query_vec = self.model.transform(query);
        if query_vec.is_empty() {
            return Vec::new();
        }

        let hits = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, v)| Hit {
                index,
                score: cosine_similarity(&query_vec, v),
            })
            .collect();

        finalize_hits(hits, top_k)
    }
}
