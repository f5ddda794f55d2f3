//! # Passage Core
//!
//! Runtime-free retrieval logic for Passage: boundary-aware chunking,
//! keyword-overlap and TF-IDF ranking, size-based strategy selection, and
//! the [`session::ContextSession`] object that owns one corpus and its
//! derived index.
//!
//! This crate performs no I/O and pulls in no async runtime.

pub mod chunk;
pub mod lexical;
pub mod retrieve;
pub mod session;
pub mod vector;
