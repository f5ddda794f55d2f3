//! Prompt log and per-character conversation history.
//!
//! Both live only for the process lifetime.

use chrono::Local;
use serde::Serialize;
use std::collections::HashMap;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One prompt sent to a model.
#[derive(Debug, Clone, Serialize)]
pub struct PromptEntry {
    pub timestamp: String,
    /// What the prompt was for, e.g. `"Chat"` or `"Character Chat: Ron Weasley"`.
    pub kind: String,
    pub prompt: String,
}

/// Every prompt sent this session, oldest first.
#[derive(Debug, Default)]
pub struct PromptHistory {
    entries: Vec<PromptEntry>,
}

impl PromptHistory {
    pub fn record(&mut self, kind: impl Into<String>, prompt: impl Into<String>) {
        self.entries.push(PromptEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            kind: kind.into(),
            prompt: prompt.into(),
        });
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Conversation history kept separately for each character.
#[derive(Debug, Default)]
pub struct Conversations {
    by_character: HashMap<String, Vec<Message>>,
}

impl Conversations {
    pub fn push(&mut self, character: &str, role: Role, content: impl Into<String>) {
        self.by_character
            .entry(character.to_string())
            .or_default()
            .push(Message {
                role,
                content: content.into(),
            });
    }

    pub fn messages(&self, character: &str) -> &[Message] {
        self.by_character
            .get(character)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The last `window` messages for `character`.
    pub fn recent(&self, character: &str, window: usize) -> &[Message] {
        let all = self.messages(character);
        &all[all.len().saturating_sub(window)..]
    }

    pub fn clear(&mut self, character: &str) {
        self.by_character.remove(character);
    }
}
