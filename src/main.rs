//! # Passage CLI (`passage`)
//!
//! Chunk a book, search it, and chat with Harry Potter characters grounded
//! in its text.
//!
//! ## Usage
//!
//! ```bash
//! passage --config ./config/passage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `passage chunk <file>` | Split a book and show chunk statistics |
//! | `passage search <file> "<query>"` | Rank a book's chunks against a query |
//! | `passage ask "<question>"` | One question to the chat model, optionally grounded with `--book` |
//! | `passage chat` | Interactive character chat |
//! | `passage image <character>` | Draw a character |
//! | `passage characters` | List the character roster |
//! | `passage completions <shell>` | Print a shell completion script |
//!
//! Commands that call the model need the API key in the environment
//! variable named by `model.api_key_env` (default `GEMINI_API_KEY`).

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use passage::config::{self, Config};
use passage::context::ContextMode;
use passage::persona::SpeakingStyle;
use passage::{chunk, repl, search};

/// Passage: book-grounded chat with character personas.
///
/// Settings come from `--config`, else `./config/passage.toml` when it
/// exists, else built-in defaults. See `config/passage.example.toml`.
#[derive(Parser)]
#[command(
    name = "passage",
    about = "Passage: book-grounded chat with character personas",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `passage_core=trace`. Overrides
    /// `logging.level`; `RUST_LOG` overrides both.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a book into chunks and print statistics.
    Chunk {
        /// Book text file.
        file: PathBuf,

        /// Maximum characters per chunk.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Also print chunk N (1-based).
        #[arg(long)]
        show: Option<usize>,
    },

    /// Rank a book's chunks against a query.
    ///
    /// Books up to 5000 characters use lexical overlap; larger books use
    /// TF-IDF similarity.
    Search {
        /// Book text file.
        file: PathBuf,

        /// The search query string.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<usize>,

        /// Maximum characters per chunk.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask one question, grounded in a book when one is given.
    Ask {
        /// The question.
        question: String,

        /// Book text file.
        #[arg(long)]
        book: Option<PathBuf>,

        /// How book content is supplied to the model.
        #[arg(long, value_enum)]
        mode: Option<ContextMode>,
    },

    /// Interactive chat with a character. Type `/help` inside for commands.
    Chat {
        /// Book text file to load at start.
        #[arg(long)]
        book: Option<PathBuf>,

        /// Character to talk to.
        #[arg(long)]
        character: Option<String>,

        /// How book content is supplied to the model.
        #[arg(long, value_enum)]
        mode: Option<ContextMode>,

        /// Formality of the character's replies.
        #[arg(long, value_enum)]
        style: Option<SpeakingStyle>,
    },

    /// Generate a picture of a character.
    ///
    /// Falls back to a placeholder image when the model returns none.
    Image {
        /// Character name.
        character: String,

        /// Extra scene details.
        #[arg(long)]
        details: Option<String>,

        /// Output file. Defaults to a timestamped file in the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the character roster.
    Characters,

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging(cli_level: Option<&str>, config: &Config) -> anyhow::Result<()> {
    let level = cli_level.unwrap_or(&config.logging.level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level: {}", level))?,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_env_filter(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Characters => {
            repl::print_characters();
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "passage", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::resolve_config(cli.config.as_deref())?;
    init_logging(cli.log_level.as_deref(), &cfg)?;

    match cli.command {
        Commands::Chunk {
            file,
            chunk_size,
            show,
        } => {
            chunk::run_chunk(&cfg, &file, chunk_size, show)?;
        }
        Commands::Search {
            file,
            query,
            top_k,
            chunk_size,
            json,
        } => {
            search::run_search(&cfg, &file, &query, top_k, chunk_size, json)?;
        }
        Commands::Ask {
            question,
            book,
            mode,
        } => {
            repl::run_ask(&cfg, book.as_deref(), &question, mode).await?;
        }
        Commands::Chat {
            book,
            character,
            mode,
            style,
        } => {
            let mut cfg = cfg;
            if let Some(style) = style {
                cfg.chat.speaking_style = style;
            }
            repl::run_chat(&cfg, book.as_deref(), character.as_deref(), mode).await?;
        }
        Commands::Image {
            character,
            details,
            out,
        } => {
            repl::run_image(&cfg, &character, details.as_deref(), out.as_deref()).await?;
        }
        Commands::Characters | Commands::Completions { .. } => {}
    }

    Ok(())
}
