//! Passage search over a loaded book.
//!
//! Application-level entry point for retrieval. The ranking itself lives
//! in `passage-core`; this wrapper loads the book, builds a
//! [`ContextSession`], and formats results for the CLI.
//!
//! # Strategies
//!
//! - **Lexical**: distinct query-token overlap, for books up to 5000
//!   characters.
//! - **Vector**: TF-IDF cosine similarity, for anything larger.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;

pub use passage_core::retrieve::{select_strategy, Hit, Strategy, VECTOR_THRESHOLD_CHARS};
use passage_core::session::ContextSession;

use crate::book;
use crate::config::Config;

/// One ranked chunk.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    /// 1-based chunk number, as shown to users.
    pub chunk: usize,
    pub score: f64,
    pub text: String,
}

/// Results plus the strategy that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub strategy: Strategy,
    pub total_chunks: usize,
    pub results: Vec<SearchResultItem>,
}

/// Rank the chunks of `session` for `query`.
pub fn search_session(session: &mut ContextSession, query: &str, top_k: usize) -> SearchResponse {
    let strategy = session.strategy();
    let hits = session.search_hits(query, top_k);
    let results = hits
        .into_iter()
        .map(|hit| SearchResultItem {
            chunk: hit.index + 1,
            score: hit.score,
            text: session.chunks()[hit.index].clone(),
        })
        .collect();

    SearchResponse {
        strategy,
        total_chunks: session.chunks().len(),
        results,
    }
}

/// CLI entry point: load `path`, search it, print the ranked chunks.
pub fn run_search(
    config: &Config,
    path: &Path,
    query: &str,
    top_k: Option<usize>,
    chunk_size: Option<usize>,
    json: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    if top_k == 0 {
        bail!("--top-k must be >= 1");
    }
    let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);
    if chunk_size == 0 {
        bail!("--chunk-size must be > 0");
    }

    let mut session = ContextSession::new();
    session.load(book::read_book(path)?, chunk_size);
    let response = search_session(&mut session, query, top_k);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "Search: strategy={}, chunks={}",
        response.strategy, response.total_chunks
    );
    println!();

    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in response.results.iter().enumerate() {
        println!(
            "{}. [{:.3}] chunk {}/{}",
            i + 1,
            result.score,
            result.chunk,
            response.total_chunks
        );
        println!("    excerpt: \"{}\"", excerpt(&result.text, 240));
        println!();
    }

    Ok(())
}

/// Single-line preview of at most `max_chars` characters.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
