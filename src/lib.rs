//! # Passage
//!
//! Book-grounded chat with character personas.
//!
//! A book is split into boundary-aware chunks, the chunks relevant to each
//! message are retrieved, and the result is handed to a text-generation
//! model as grounding context. Retrieval switches from lexical overlap to
//! TF-IDF similarity once the book grows past a few thousand characters.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │   Book   │──▶│   Chunker    │──▶│  Retrieval   │──▶│  Prompt  │
//! │  (text)  │   │ (size, cuts) │   │ lexical/tfidf│   │ + model  │
//! └──────────┘   └──────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The chunker and both retrieval strategies live in `passage-core`, which
//! has no I/O. This crate adds configuration, the model client, personas,
//! and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! passage chunk book.txt --show 1
//! passage search book.txt "invisibility cloak"
//! passage ask "Who gave Harry the cloak?" --book book.txt
//! passage chat --book book.txt --character "Luna Lovegood"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`book`] | Reading book text from disk |
//! | [`chunk`] | Text chunking |
//! | [`search`] | Ranked passage search |
//! | [`context`] | Choosing grounding text per context mode |
//! | [`generate`] | Text and image generation client |
//! | [`persona`] | Character roster and persona instructions |
//! | [`history`] | Prompt log and conversations |
//! | [`chat`] | Chat orchestration |
//! | [`image`] | Image generation with placeholder fallback |
//! | [`repl`] | `ask` and the interactive chat loop |

pub mod book;
pub mod chat;
pub mod chunk;
pub mod config;
pub mod context;
pub mod generate;
pub mod history;
pub mod image;
pub mod persona;
pub mod repl;
pub mod search;
