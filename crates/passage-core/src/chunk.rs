//! Boundary-aware text chunker.
//!
//! Splits an uploaded corpus into an ordered sequence of chunks, each at
//! most `chunk_size` characters long. Cuts prefer natural boundaries so
//! that adjacent chunks read as adjacent passages.
//!
//! # Algorithm
//!
//! Starting at position `p`, the window `[p, p + chunk_size)` is scanned
//! from the right for, in order of preference:
//!
//! 1. a paragraph break (`\n\n`), cut after the pair;
//! 2. a sentence end (`. `), cut after the space;
//! 3. a single newline, cut after it.
//!
//! If none is found the window is hard-cut at `p + chunk_size`. Once the
//! remainder fits in one window it becomes the final chunk verbatim.
//!
//! All lengths are counted in characters (Unicode scalar values), never
//! bytes, so a cut never lands inside a multi-byte sequence.
//!
//! # Guarantees
//!
//! - Concatenating the chunks in order reproduces the input exactly.
//! - No chunk is longer than `chunk_size` characters.
//! - Every cut strictly advances, so the loop always terminates.
//!
//! # Example
//!
//! ```rust
//! use passage_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Para one.\n\nPara two.\n\nPara three.", 12);
//! assert_eq!(chunks, vec!["Para one.\n\n", "Para two.\n\n", "Para three."]);
//! ```

use serde::Serialize;

/// Boundary markers, most preferred first.
const BOUNDARIES: [&str; 3] = ["\n\n", ". ", "\n"];

/// Split `text` into ordered chunks of at most `chunk_size` characters.
///
/// A `chunk_size` of zero is treated as one so that progress is always
/// possible.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);

    // Byte offset of every char start, plus the end of the string, so
    // character positions map straight to slice bounds.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = offsets.len() - 1;

    if total_chars <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut pos = 0usize;

    while pos < total_chars {
        if pos + chunk_size >= total_chars {
            chunks.push(text[offsets[pos]..].to_string());
            break;
        }

        let window_end = pos + chunk_size;
        let start_byte = offsets[pos];
        let window = &text[start_byte..offsets[window_end]];

        let cut = find_boundary(window)
            .map(|byte_in_window| char_position(&offsets, start_byte + byte_in_window))
            .filter(|&cut| cut > pos)
            .unwrap_or(window_end);

        chunks.push(text[start_byte..offsets[cut]].to_string());
        pos = cut;
    }

    chunks
}

/// Byte offset (relative to `window`) just past the preferred boundary.
fn find_boundary(window: &str) -> Option<usize> {
    BOUNDARIES
        .iter()
        .find_map(|marker| window.rfind(marker).map(|at| at + marker.len()))
}

/// Map a byte offset that sits on a char boundary back to its char index.
fn char_position(offsets: &[usize], byte: usize) -> usize {
    offsets.partition_point(|&o| o < byte)
}

/// Summary of a chunk sequence, shown when a corpus is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkStats {
    pub count: usize,
    pub total_chars: usize,
    /// Integer mean chunk length; zero for an empty sequence.
    pub average_chars: usize,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[String]) -> Self {
        let total_chars = total_chars(chunks);
        let count = chunks.len();
        Self {
            count,
            total_chars,
            average_chars: if count == 0 { 0 } else { total_chars / count },
        }
    }
}

/// Sum of chunk lengths in characters.
pub fn total_chars(chunks: &[String]) -> usize {
    chunks.iter().map(|c| c.chars().count()).sum()
}
