//! Reading uploaded book text.

use anyhow::{Context, Result};
use std::path::Path;

/// Read a UTF-8 text file in full.
///
/// No structure is assumed; the whole file becomes the corpus.
pub fn read_book(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read book: {}", path.display()))?;
    tracing::debug!(path = %path.display(), chars = text.chars().count(), "read book");
    Ok(text)
}
