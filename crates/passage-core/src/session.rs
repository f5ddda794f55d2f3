//! Session-scoped retrieval state.
//!
//! [`ContextSession`] is the explicit context object that owns one
//! uploaded corpus for its lifetime: the raw text, its chunk sequence, the
//! active chunk pointer, and the lazily built [`VectorIndex`].
//!
//! The chunk sequence is only ever replaced wholesale through
//! [`ContextSession::load`] or [`ContextSession::clear`]. Each replacement
//! bumps a generation counter, and the cached index remembers the
//! generation it was built from. A query never runs against an index from
//! another generation: it is rebuilt first.

use crate::chunk::{chunk_text, total_chars, ChunkStats};
use crate::lexical::LexicalScorer;
use crate::retrieve::{select_strategy, Hit, Retriever, Strategy};
use crate::vector::VectorIndex;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

#[derive(Debug)]
struct CachedIndex {
    generation: u64,
    index: VectorIndex,
}

/// Corpus, chunks, active pointer, and cached index for one session.
#[derive(Debug, Default)]
pub struct ContextSession {
    corpus: String,
    chunks: Vec<String>,
    chunk_size: usize,
    active: usize,
    total_chars: usize,
    generation: u64,
    index: Option<CachedIndex>,
}

impl ContextSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the corpus and re-chunk it.
    ///
    /// Resets the active chunk to the first one and drops any cached index.
    pub fn load(&mut self, text: impl Into<String>, chunk_size: usize) -> ChunkStats {
        let corpus = text.into();
        let chunks = chunk_text(&corpus, chunk_size);
        self.total_chars = total_chars(&chunks);
        self.corpus = corpus;
        self.chunks = chunks;
        self.chunk_size = chunk_size;
        self.active = 0;
        self.invalidate();

        let stats = self.stats();
        tracing::info!(
            chunks = stats.count,
            total_chars = stats.total_chars,
            chunk_size,
            "loaded corpus"
        );
        stats
    }

    /// Drop the corpus and all derived state.
    pub fn clear(&mut self) {
        self.corpus.clear();
        self.chunks.clear();
        self.chunk_size = 0;
        self.active = 0;
        self.total_chars = 0;
        self.invalidate();
        tracing::info!("cleared corpus");
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.index = None;
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Chunk size used for the current corpus; zero when nothing is loaded.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// True when there are no chunks to search.
    ///
    /// A session is never left holding a corpus without chunks: loading
    /// even an empty string yields one (empty) chunk.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn stats(&self) -> ChunkStats {
        ChunkStats::from_chunks(&self.chunks)
    }

    /// Identity of the current chunk sequence.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Point at chunk `index`, clamped to the valid range.
    pub fn set_active_chunk(&mut self, index: usize) -> usize {
        self.active = index.min(self.chunks.len().saturating_sub(1));
        self.active
    }

    /// Text of the active chunk, or `""` when there are no chunks.
    pub fn active_chunk(&self) -> &str {
        self.chunks.get(self.active).map(String::as_str).unwrap_or("")
    }

    /// Strategy a query against the current corpus would use.
    pub fn strategy(&self) -> Strategy {
        select_strategy(self.total_chars)
    }

    /// True when a vector index for the current chunk sequence is cached.
    pub fn has_current_index(&self) -> bool {
        self.index
            .as_ref()
            .is_some_and(|cached| cached.generation == self.generation)
    }

    /// Rank chunks for `query`, choosing the strategy by corpus size.
    ///
    /// Returns no hits for an empty session or a query with no usable
    /// terms; callers decide what to fall back to.
    pub fn search_hits(&mut self, query: &str, top_k: usize) -> Vec<Hit> {
        if self.chunks.is_empty() {
            return Vec::new();
        }

        let strategy = self.strategy();
        let hits = match strategy {
            Strategy::Lexical => LexicalScorer::new(&self.chunks).rank(query, top_k),
            Strategy::Vector => self.current_index().rank(query, top_k),
        };
        tracing::debug!(%strategy, hits = hits.len(), "searched corpus");
        hits
    }

    /// Like [`search_hits`](Self::search_hits), resolved to chunk text in
    /// ranked order.
    pub fn search(&mut self, query: &str, top_k: usize) -> Vec<&str> {
        let hits = self.search_hits(query, top_k);
        hits.iter()
            .map(|h| self.chunks[h.index].as_str())
            .collect()
    }

    fn current_index(&mut self) -> &VectorIndex {
        if !self.has_current_index() {
            tracing::debug!(generation = self.generation, "rebuilding vector index");
            self.index = None;
        }
        let generation = self.generation;
        let chunks = &self.chunks;
        &self
            .index
            .get_or_insert_with(|| CachedIndex {
                generation,
                index: VectorIndex::build(chunks),
            })
            .index
    }
}
