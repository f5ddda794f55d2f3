//! TOML configuration.
//!
//! Every section is optional; a missing section or key takes its default.
//! [`load_config`] parses and validates a file, [`resolve_config`] applies
//! the CLI lookup rules (explicit path, then `./config/passage.toml`, then
//! built-in defaults).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::context::ContextMode;
use crate::persona::{self, SpeakingStyle};

/// Location checked when no `--config` flag is given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/passage.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    passage_core::session::DEFAULT_CHUNK_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub context_mode: ContextMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_mode: ContextMode::default(),
        }
    }
}

fn default_top_k() -> usize {
    passage_core::retrieve::DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_chat_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_image_model() -> String {
    "gemini-2.0-flash-exp-image-generation".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,
    #[serde(default = "default_image_side")]
    pub width: u32,
    #[serde(default = "default_image_side")]
    pub height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder_url: default_placeholder_url(),
            width: default_image_side(),
            height: default_image_side(),
        }
    }
}

fn default_placeholder_url() -> String {
    "https://picsum.photos".to_string()
}
fn default_image_side() -> u32 {
    512
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Number of most recent messages replayed into character prompts.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_character")]
    pub character: String,
    #[serde(default)]
    pub speaking_style: SpeakingStyle,
    #[serde(default)]
    pub custom_description: Option<String>,
    #[serde(default)]
    pub favorite_topics: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            character: default_character(),
            speaking_style: SpeakingStyle::default(),
            custom_description: None,
            favorite_topics: None,
        }
    }
}

fn default_history_window() -> usize {
    10
}
fn default_character() -> String {
    "Harry Potter".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read, parse, and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `explicit` if given; otherwise the default path if it exists;
/// otherwise built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
    if fallback.exists() {
        load_config(&fallback)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=100_000).contains(&config.chunking.chunk_size) {
        bail!("chunking.chunk_size must be in 1..=100000");
    }

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.model.timeout_secs == 0 {
        bail!("model.timeout_secs must be > 0");
    }

    if config.model.chat_model.trim().is_empty() || config.model.image_model.trim().is_empty() {
        bail!("model.chat_model and model.image_model must not be empty");
    }

    if config.image.width == 0 || config.image.height == 0 {
        bail!("image.width and image.height must be > 0");
    }

    if persona::find(&config.chat.character).is_none() {
        bail!(
            "Unknown chat.character: '{}'. Run `passage characters` for the roster.",
            config.chat.character
        );
    }

    Ok(())
}
