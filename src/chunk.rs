//! Boundary-aware chunker, re-exported from `passage-core`, plus the
//! `passage chunk` command.
//!
//! # Example
//!
//! ```rust
//! use passage::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", 2000);
//! assert_eq!(chunks.len(), 1);
//! ```

use anyhow::{bail, Result};
use std::path::Path;

pub use passage_core::chunk::*;

use crate::book;
use crate::config::Config;

/// CLI entry point: chunk a book and print its overview plus one chunk.
pub fn run_chunk(
    config: &Config,
    path: &Path,
    chunk_size: Option<usize>,
    show: Option<usize>,
) -> Result<()> {
    let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);
    if chunk_size == 0 {
        bail!("--chunk-size must be > 0");
    }

    let text = book::read_book(path)?;
    let chunks = chunk_text(&text, chunk_size);
    let stats = ChunkStats::from_chunks(&chunks);

    println!("{}", path.display());
    println!("  chunk size:    {}", chunk_size);
    println!("  total chunks:  {}", stats.count);
    println!("  total chars:   {}", stats.total_chars);
    println!("  average chunk: {} characters", stats.average_chars);

    if let Some(n) = show {
        if n == 0 || n > chunks.len() {
            bail!("--show must be between 1 and {}", chunks.len());
        }
        println!();
        println!("--- chunk {} of {} ---", n, chunks.len());
        println!("{}", chunks[n - 1]);
    }

    Ok(())
}
