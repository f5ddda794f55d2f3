//! `passage ask`, `passage image`, and the interactive `passage chat` loop.
//!
//! Lines starting with `/` are session commands; anything else is sent to
//! the current character.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/load FILE` | Load a book, replacing the current one |
//! | `/unload` | Drop the loaded book |
//! | `/chunk N` | Make chunk N (1-based) the active chunk |
//! | `/mode auto\|active\|all` | Choose how book content is used |
//! | `/character NAME` | Switch persona |
//! | `/characters` | List personas |
//! | `/clear` | Clear the current character's conversation |
//! | `/history` | Show prompts sent this session |
//! | `/history clear` | Forget the prompts sent so far |
//! | `/image [DETAILS]` | Generate a picture of the current character |
//! | `/image show` | Show the current image's file and caption |
//! | `/image clear` | Unset the current image |
//! | `/images` | List the last five images |
//! | `/quit` | Leave |

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::book;
use crate::chat::ChatEngine;
use crate::config::Config;
use crate::context::ContextMode;
use crate::generate::GeminiClient;
use crate::image::{self, HttpPlaceholder, ImageRecord, SavedImage};
use crate::persona;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Message(String),
    Load(PathBuf),
    Unload,
    Chunk(usize),
    Mode(ContextMode),
    Character(String),
    Characters,
    Clear,
    History,
    ClearHistory,
    Image(Option<String>),
    ShowImage,
    ClearImage,
    Images,
    Help,
    Quit,
    Empty,
}

/// Parse one line of REPL input.
pub fn parse_line(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Message(line.to_string()));
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (rest, ""),
    };

    let command = match cmd {
        "load" if !arg.is_empty() => ReplCommand::Load(PathBuf::from(arg)),
        "load" => bail!("usage: /load FILE"),
        "unload" => ReplCommand::Unload,
        "chunk" => {
            let n: usize = arg.parse().context("usage: /chunk N (1-based)")?;
            if n == 0 {
                bail!("chunks are numbered from 1");
            }
            ReplCommand::Chunk(n)
        }
        "mode" => ReplCommand::Mode(arg.parse()?),
        "character" if !arg.is_empty() => ReplCommand::Character(arg.to_string()),
        "character" => bail!("usage: /character NAME"),
        "characters" => ReplCommand::Characters,
        "clear" => ReplCommand::Clear,
        "history" => match arg {
            "" => ReplCommand::History,
            "clear" => ReplCommand::ClearHistory,
            other => bail!("unknown argument: /history {} (try /history clear)", other),
        },
        "clear-history" => ReplCommand::ClearHistory,
        "image" => match arg {
            "" => ReplCommand::Image(None),
            "show" => ReplCommand::ShowImage,
            "clear" => ReplCommand::ClearImage,
            details => ReplCommand::Image(Some(details.to_string())),
        },
        "images" => ReplCommand::Images,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => bail!("unknown command: /{} (try /help)", other),
    };
    Ok(command)
}

/// CLI entry point for a single grounded question.
pub async fn run_ask(
    config: &Config,
    path: Option<&Path>,
    question: &str,
    mode: Option<ContextMode>,
) -> Result<()> {
    let client = GeminiClient::new(&config.model)?;
    let mut engine = ChatEngine::from_config(config)?;
    if let Some(mode) = mode {
        engine.mode = mode;
    }
    if let Some(path) = path {
        engine.load_book(book::read_book(path)?);
    }

    let reply = engine.ask(&client, question).await;
    if reply.is_error {
        bail!("{}", reply.text);
    }
    println!("{}", reply.text);
    Ok(())
}

/// CLI entry point for the interactive chat loop.
pub async fn run_chat(
    config: &Config,
    path: Option<&Path>,
    character: Option<&str>,
    mode: Option<ContextMode>,
) -> Result<()> {
    let client = GeminiClient::new(&config.model)?;
    let placeholder = HttpPlaceholder::new(&config.image, config.model.timeout_secs)?;
    let mut engine = ChatEngine::from_config(config)?;
    if let Some(name) = character {
        engine.select_character(name)?;
    }
    if let Some(mode) = mode {
        engine.mode = mode;
    }
    if let Some(path) = path {
        load(&mut engine, path)?;
    }

    tracing::info!(session = %engine.id(), character = engine.character().name, "chat started");

    let interactive = atty::is(atty::Stream::Stdin);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Chatting with {} (context: {}). Type /help for commands.",
        engine.character().name,
        engine.mode.as_str()
    );

    loop {
        if interactive {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(c) => c,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Message(text) => {
                let reply = engine.send(&client, &text).await;
                println!("{}: {}", engine.character().name, reply.text);
            }
            ReplCommand::Load(path) => {
                if let Err(e) = load(&mut engine, &path) {
                    println!("Error: {:#}", e);
                }
            }
            ReplCommand::Unload => {
                engine.session.clear();
                println!("Book content cleared.");
            }
            ReplCommand::Chunk(n) => {
                if engine.session.is_empty() {
                    println!("No book loaded.");
                } else {
                    let active = engine.session.set_active_chunk(n - 1);
                    println!(
                        "Active chunk {}/{}:\n{}",
                        active + 1,
                        engine.session.chunks().len(),
                        engine.session.active_chunk()
                    );
                }
            }
            ReplCommand::Mode(mode) => {
                engine.mode = mode;
                if mode == ContextMode::All {
                    println!("Using all chunks may exceed context limits for very large books.");
                }
                println!("Context mode: {}", mode.as_str());
            }
            ReplCommand::Character(name) => match engine.select_character(&name) {
                Ok(c) => println!("Now chatting with {}. {}", c.name, c.description),
                Err(e) => println!("{}", e),
            },
            ReplCommand::Characters => print_characters(),
            ReplCommand::Clear => {
                let name = engine.character().name;
                engine.conversations.clear(name);
                println!("{}'s conversation history cleared.", name);
            }
            ReplCommand::History => {
                if engine.prompts.entries().is_empty() {
                    println!("No prompts have been sent yet.");
                }
                for entry in engine.prompts.entries().iter().rev() {
                    println!("== {} - {}\n{}\n", entry.timestamp, entry.kind, entry.prompt);
                }
            }
            ReplCommand::ClearHistory => {
                engine.prompts.clear();
                println!("Prompt history cleared.");
            }
            ReplCommand::ShowImage => match engine.images.current() {
                Some(img) => print_saved_image(img),
                None => println!("No character image generated yet."),
            },
            ReplCommand::ClearImage => {
                if engine.images.clear_current() {
                    println!("Current image cleared.");
                } else {
                    println!("No current image.");
                }
            }
            ReplCommand::Images => {
                if engine.images.records().is_empty() {
                    println!("No images generated yet.");
                }
                let total = engine.images.records().len();
                for (i, img) in engine.images.recent(5).enumerate() {
                    println!("Image {}", total - i);
                    print_saved_image(img);
                }
            }
            ReplCommand::Image(details) => {
                let prompt =
                    image::character_image_prompt(engine.character().name, details.as_deref());
                let result = image::generate_image(
                    &client,
                    &placeholder,
                    &config.image,
                    &config.model.image_model,
                    &prompt,
                    &mut engine.prompts,
                )
                .await;
                match result {
                    Ok(record) => {
                        let out = default_image_path(&record);
                        match save_image(&record, &out) {
                            Ok(()) => {
                                println!("Saved {}", out.display());
                                engine.images.push(&record, out);
                            }
                            Err(e) => println!("Error: {:#}", e),
                        }
                    }
                    Err(e) => println!("Error generating image: {:#}", e),
                }
            }
        }
    }

    tracing::info!(
        session = %engine.id(),
        prompts = engine.prompts.entries().len(),
        images = engine.images.records().len(),
        "chat ended"
    );
    Ok(())
}

/// CLI entry point: draw `character` and write the image to `out`, or to a
/// timestamped file in the current directory.
pub async fn run_image(
    config: &Config,
    character: &str,
    details: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let character = persona::find(character)
        .with_context(|| format!("Unknown character: {}", character))?;
    let client = GeminiClient::new(&config.model)?;
    let placeholder = HttpPlaceholder::new(&config.image, config.model.timeout_secs)?;
    let mut prompts = crate::history::PromptHistory::default();

    let prompt = image::character_image_prompt(character.name, details);
    let record = image::generate_image(
        &client,
        &placeholder,
        &config.image,
        &config.model.image_model,
        &prompt,
        &mut prompts,
    )
    .await?;

    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_image_path(&record));
    save_image(&record, &out)?;
    println!("Saved {}", out.display());
    Ok(())
}

fn load(engine: &mut ChatEngine, path: &Path) -> Result<()> {
    let stats = engine.load_book(book::read_book(path)?);
    println!(
        "Book uploaded and split into {} chunks (average {} characters).",
        stats.count, stats.average_chars
    );
    Ok(())
}

/// Print the persona roster.
pub fn print_characters() {
    for c in persona::CHARACTERS.iter() {
        println!("{}\n    {}", c.name, c.description);
    }
}

fn print_saved_image(img: &SavedImage) {
    let note = if img.placeholder { " (placeholder)" } else { "" };
    println!("  file:      {}{}", img.path.display(), note);
    println!("  prompt:    {}", img.prompt);
    println!("  generated: {}", img.timestamp);
    if let Some(caption) = &img.caption {
        println!("  caption:   {}", caption);
    }
}

fn default_image_path(record: &ImageRecord) -> PathBuf {
    PathBuf::from(format!(
        "passage_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        record.extension()
    ))
}

/// Write `record` to `out` and report what was produced.
pub fn save_image(record: &ImageRecord, out: &Path) -> Result<()> {
    std::fs::write(out, &record.bytes)
        .with_context(|| format!("Failed to write image: {}", out.display()))?;
    if record.placeholder {
        tracing::info!(path = %out.display(), "saved placeholder image");
    }
    if let Some(caption) = &record.caption {
        println!("{}", caption);
    }
    Ok(())
}

const HELP: &str = "\
/load FILE            load a book (replaces the current one)
/unload               drop the loaded book
/chunk N              make chunk N the active chunk
/mode auto|active|all choose how book content is used
/character NAME       switch character
/characters           list characters
/clear                clear this character's conversation
/history              show prompts sent this session
/history clear        forget the prompts sent so far
/image [DETAILS]      draw the current character
/image show           show the current image
/image clear          unset the current image
/images               list the last five images
/quit                 leave";
