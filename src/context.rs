//! Grounding-context selection.
//!
//! The retrieval core never substitutes a default chunk when a search
//! comes back empty. That decision lives here, as an ordered list of
//! [`ContextSource`]s per [`ContextMode`]: the first source that yields
//! non-empty text wins.
//!
//! | Mode | Sources, in order |
//! |------|-------------------|
//! | `auto` | search, active chunk |
//! | `active` | active chunk |
//! | `all` | all chunks |
//!
//! Loading any text yields at least one chunk, so the chunks always cover
//! the whole book; a session with nothing loaded gets no context.

use passage_core::session::ContextSession;
use serde::{Deserialize, Serialize};

/// How book content is supplied to the model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Search for relevant chunks, falling back to the active chunk.
    #[default]
    Auto,
    /// Use only the active chunk.
    Active,
    /// Use every chunk. May exceed model context limits for long books.
    All,
}

impl ContextMode {
    pub fn policies(&self) -> &'static [ContextSource] {
        match self {
            ContextMode::Auto => &[ContextSource::Search, ContextSource::ActiveChunk],
            ContextMode::Active => &[ContextSource::ActiveChunk],
            ContextMode::All => &[ContextSource::AllChunks],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Auto => "auto",
            ContextMode::Active => "active",
            ContextMode::All => "all",
        }
    }
}

impl std::str::FromStr for ContextMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ContextMode::Auto),
            "active" => Ok(ContextMode::Active),
            "all" => Ok(ContextMode::All),
            other => anyhow::bail!("Unknown context mode: {}. Use auto, active, or all.", other),
        }
    }
}

/// One way of producing grounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextSource {
    Search,
    ActiveChunk,
    AllChunks,
}

/// Grounding text chosen for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub text: String,
    /// Source that produced `text`; `None` when nothing did.
    pub source: Option<ContextSource>,
}

/// Evaluate `mode`'s sources in order and return the first non-empty one.
pub fn resolve_context(
    session: &mut ContextSession,
    mode: ContextMode,
    query: &str,
    top_k: usize,
) -> ResolvedContext {
    for &source in mode.policies() {
        let text = match source {
            ContextSource::Search => session.search(query, top_k).join("\n\n"),
            ContextSource::ActiveChunk => session.active_chunk().to_string(),
            ContextSource::AllChunks => session.chunks().join("\n\n"),
        };
        if !text.is_empty() {
            tracing::debug!(?source, chars = text.len(), "resolved grounding context");
            return ResolvedContext {
                text,
                source: Some(source),
            };
        }
    }

    ResolvedContext {
        text: String::new(),
        source: None,
    }
}
