//! Chat orchestration: context resolution, prompt assembly, model call.
//!
//! [`ChatEngine`] owns everything one interactive session needs: the
//! [`ContextSession`] for the loaded book, per-character conversations,
//! the prompt log, and the selected persona. Model failures are turned
//! into a user-visible reply here and never touch the book state.

use anyhow::{anyhow, Result};
use passage_core::session::ContextSession;
use uuid::Uuid;

use crate::config::Config;
use crate::context::{resolve_context, ContextMode, ContextSource};
use crate::generate::TextGenerator;
use crate::history::{Conversations, Message, PromptHistory, Role};
use crate::image::ImageGallery;
use crate::persona::{self, Character, CharacterSettings};

/// Reply shown to the user for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// True when `text` is an error message rather than a model reply.
    pub is_error: bool,
    pub context_source: Option<ContextSource>,
}

/// Prompt for a plain question, grounded in `context` when present.
pub fn build_plain_prompt(context: &str, question: &str) -> String {
    if context.is_empty() {
        return question.to_string();
    }
    format!(
        "Context information:\n{}\n\nNow, please respond to the following question or request using the context above when relevant:\n{}",
        context, question
    )
}

/// Prompt for an in-character reply.
///
/// `history` should already include the message being answered.
pub fn build_character_prompt(
    character: &Character,
    settings: &CharacterSettings,
    context: &str,
    history: &[Message],
    message: &str,
) -> String {
    let name = character.name;
    let mut prompt = persona::instructions(character, settings);

    if !context.is_empty() {
        prompt.push_str("\n\nReference information from Harry Potter books:\n");
        prompt.push_str(context);
    }

    if !history.is_empty() {
        prompt.push_str("\n\nPrevious conversation history:\n");
        for msg in history {
            let speaker = match msg.role {
                Role::User => "Human",
                Role::Assistant => name,
            };
            prompt.push_str(&format!("{}: {}\n", speaker, msg.content));
        }
    }

    prompt.push_str(&format!(
        "\n\nRemember to maintain continuity with the conversation history above.\n\
         Now, please respond AS {name} to the following message:\n\
         Human: {message}\n\n\
         {name}:"
    ));
    prompt
}

/// State and settings for one chat session.
pub struct ChatEngine {
    id: Uuid,
    pub session: ContextSession,
    pub conversations: Conversations,
    pub prompts: PromptHistory,
    pub images: ImageGallery,
    pub mode: ContextMode,
    pub top_k: usize,
    pub history_window: usize,
    pub chunk_size: usize,
    pub chat_model: String,
    pub settings: CharacterSettings,
    character: &'static Character,
}

impl ChatEngine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let character = persona::find(&config.chat.character)
            .ok_or_else(|| anyhow!("Unknown character: {}", config.chat.character))?;
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, character = character.name, "started chat session");

        Ok(Self {
            id,
            session: ContextSession::new(),
            conversations: Conversations::default(),
            prompts: PromptHistory::default(),
            images: ImageGallery::default(),
            mode: config.retrieval.context_mode,
            top_k: config.retrieval.top_k,
            history_window: config.chat.history_window,
            chunk_size: config.chunking.chunk_size,
            chat_model: config.model.chat_model.clone(),
            settings: CharacterSettings::from_config(&config.chat),
            character,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn character(&self) -> &'static Character {
        self.character
    }

    /// Switch persona. Each character keeps its own history.
    pub fn select_character(&mut self, name: &str) -> Result<&'static Character> {
        let character = persona::find(name).ok_or_else(|| anyhow!("Unknown character: {}", name))?;
        self.character = character;
        Ok(character)
    }

    /// Load book text into the session using the configured chunk size.
    pub fn load_book(&mut self, text: impl Into<String>) -> passage_core::chunk::ChunkStats {
        self.session.load(text, self.chunk_size)
    }

    /// Answer a plain question, grounded in the loaded book.
    pub async fn ask(&mut self, generator: &dyn TextGenerator, question: &str) -> ChatReply {
        let context = resolve_context(&mut self.session, self.mode, question, self.top_k);
        let prompt = build_plain_prompt(&context.text, question);
        self.prompts.record("Chat", prompt.as_str());

        match generator.generate(&self.chat_model, &prompt).await {
            Ok(text) => ChatReply {
                text,
                is_error: false,
                context_source: context.source,
            },
            Err(e) => error_reply(e, context.source),
        }
    }

    /// Send `message` to the current character and record the exchange.
    pub async fn send(&mut self, generator: &dyn TextGenerator, message: &str) -> ChatReply {
        let name = self.character.name;
        self.conversations.push(name, Role::User, message);

        let context = resolve_context(&mut self.session, self.mode, message, self.top_k);
        let prompt = build_character_prompt(
            self.character,
            &self.settings,
            &context.text,
            self.conversations.recent(name, self.history_window),
            message,
        );
        self.prompts
            .record(format!("Character Chat: {}", name), prompt.as_str());

        match generator.generate(&self.chat_model, &prompt).await {
            Ok(text) => {
                self.conversations.push(name, Role::Assistant, text.as_str());
                ChatReply {
                    text,
                    is_error: false,
                    context_source: context.source,
                }
            }
            Err(e) => error_reply(e, context.source),
        }
    }
}

fn error_reply(e: anyhow::Error, context_source: Option<ContextSource>) -> ChatReply {
    tracing::warn!(error = %e, "text generation failed");
    ChatReply {
        text: format!("Error: {}", e),
        is_error: true,
        context_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes a fixed reply and remembers every prompt it was given.
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Blimey!".to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
            bail!("connection reset")
        }
    }

    fn engine() -> ChatEngine {
        let mut config = Config::default();
        config.chat.character = "Ron Weasley".to_string();
        config.chunking.chunk_size = 40;
        ChatEngine::from_config(&config).unwrap()
    }

    #[test]
    fn test_plain_prompt_without_context() {
        assert_eq!(build_plain_prompt("", "Who is Dobby?"), "Who is Dobby?");
        assert!(build_plain_prompt("Dobby is an elf.", "Who?").starts_with("Context information:\nDobby is an elf."));
    }

    #[tokio::test]
    async fn test_send_records_exchange() {
        let mut e = engine();
        e.load_book("Scabbers is a rat.\n\nThe Burrow is crooked and warm.");
        let gen = Recorder::default();

        let reply = e.send(&gen, "Tell me about Scabbers").await;
        assert!(!reply.is_error);
        assert_eq!(reply.text, "Blimey!");
        assert_eq!(reply.context_source, Some(ContextSource::Search));

        let msgs = e.conversations.messages("Ron Weasley");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].role, Role::Assistant);

        let prompt = gen.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Scabbers is a rat."));
        assert!(!prompt.contains("The Burrow"));
        assert!(prompt.contains("Human: Tell me about Scabbers"));
        assert!(prompt.trim_end().ends_with("Ron Weasley:"));
        assert_eq!(e.prompts.entries()[0].kind, "Character Chat: Ron Weasley");
    }

    #[tokio::test]
    async fn test_failure_leaves_state_untouched() {
        let mut e = engine();
        e.load_book("Scabbers is a rat.");
        let generation = e.session.generation();

        let reply = e.send(&Broken, "hello").await;
        assert!(reply.is_error);
        assert_eq!(reply.text, "Error: connection reset");
        assert_eq!(e.session.generation(), generation);
        assert_eq!(e.session.chunks(), ["Scabbers is a rat."]);
        let msgs = e.conversations.messages("Ron Weasley");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_ask_without_book_sends_bare_question() {
        let mut e = engine();
        let gen = Recorder::default();
        let reply = e.ask(&gen, "What is a Horcrux?").await;
        assert_eq!(reply.context_source, None);
        assert_eq!(gen.prompts.lock().unwrap()[0], "What is a Horcrux?");
    }

    #[tokio::test]
    async fn test_history_window_applied() {
        let mut e = engine();
        e.history_window = 2;
        let gen = Recorder::default();
        e.send(&gen, "first message").await;
        e.send(&gen, "second message").await;
        let prompt = gen.prompts.lock().unwrap()[1].clone();
        assert!(!prompt.contains("Human: first message\n"));
        assert!(prompt.contains("Ron Weasley: Blimey!\n"));
        assert!(prompt.contains("Human: second message\n"));
    }

    #[test]
    fn test_each_engine_gets_its_own_id() {
        assert_ne!(engine().id(), engine().id());
    }

    #[test]
    fn test_select_character() {
        let mut e = engine();
        assert_eq!(e.select_character("luna lovegood").unwrap().name, "Luna Lovegood");
        assert!(e.select_character("Voldemort").is_err());
        assert_eq!(e.character().name, "Luna Lovegood");
    }
}
