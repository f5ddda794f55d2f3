//! Character roster and persona instructions.

use serde::{Deserialize, Serialize};

/// A character the model can role-play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Character {
    pub name: &'static str,
    pub description: &'static str,
}

pub const CHARACTERS: [Character; 10] = [
    Character {
        name: "Harry Potter",
        description: "A brave, humble boy who survived Voldemort's attack. Known for his courage, loyalty, and occasional impulsiveness.",
    },
    Character {
        name: "Hermione Granger",
        description: "Exceptionally intelligent and studious witch, logical and detail-oriented. Values knowledge and preparation, fiercely loyal to her friends.",
    },
    Character {
        name: "Ron Weasley",
        description: "Loyal friend with a good sense of humor. Sometimes insecure but brave when it counts. From a large, loving wizard family.",
    },
    Character {
        name: "Albus Dumbledore",
        description: "Wise, enigmatic headmaster of Hogwarts. Speaks in riddles and believes in the power of love. Has deep knowledge of magic.",
    },
    Character {
        name: "Severus Snape",
        description: "Complex, stern Potions professor with a difficult past. Sharp-tongued and seemingly cold, but secretly protective.",
    },
    Character {
        name: "Rubeus Hagrid",
        description: "Half-giant gamekeeper with a big heart. Speaks in a distinct dialect, loves magical creatures, and is fiercely loyal to Dumbledore.",
    },
    Character {
        name: "Luna Lovegood",
        description: "Eccentric, dreamy student who believes in unusual creatures. Honest to a fault and unaffected by others' opinions.",
    },
    Character {
        name: "Draco Malfoy",
        description: "Arrogant Slytherin from a wealthy pure-blood family. Antagonistic but complex, struggles with the expectations placed on him.",
    },
    Character {
        name: "Minerva McGonagall",
        description: "Strict but fair Transfiguration professor and Head of Gryffindor. Proper, no-nonsense attitude but deeply cares for students.",
    },
    Character {
        name: "Sirius Black",
        description: "Harry's godfather, mischievous and rebellious. Intensely loyal, sometimes reckless, carries the trauma of his imprisonment in Azkaban.",
    },
];

/// Look up a character by name, ignoring ASCII case.
pub fn find(name: &str) -> Option<&'static Character> {
    CHARACTERS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

/// Formality of the character's replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SpeakingStyle {
    VeryCasual,
    Casual,
    #[default]
    Neutral,
    Formal,
    VeryFormal,
}

impl SpeakingStyle {
    pub fn label(&self) -> &'static str {
        match self {
            SpeakingStyle::VeryCasual => "very casual",
            SpeakingStyle::Casual => "casual",
            SpeakingStyle::Neutral => "neutral",
            SpeakingStyle::Formal => "formal",
            SpeakingStyle::VeryFormal => "very formal",
        }
    }
}

/// Optional per-session tweaks layered on top of a character.
#[derive(Debug, Clone, Default)]
pub struct CharacterSettings {
    pub custom_description: Option<String>,
    /// Comma-separated topics.
    pub favorite_topics: Option<String>,
    pub speaking_style: SpeakingStyle,
}

impl CharacterSettings {
    pub fn from_config(chat: &crate::config::ChatConfig) -> Self {
        Self {
            custom_description: chat.custom_description.clone(),
            favorite_topics: chat.favorite_topics.clone(),
            speaking_style: chat.speaking_style,
        }
    }
}

/// Role-play instructions for `character`.
pub fn instructions(character: &Character, settings: &CharacterSettings) -> String {
    let name = character.name;
    let mut out = format!(
        "You are roleplaying as {name} from the Harry Potter series.\n\n\
         Character description: {desc}\n\n\
         Your responses should authentically reflect this character's personality, knowledge, speech patterns, and worldview.\n\
         You should respond as if you ARE this character, not as an AI pretending to be them.\n\n\
         Don't use phrases like \"As {name}, I would...\" - just respond directly as the character would.\n\n\
         When responding, consider:\n\
         - The character's unique speech patterns and vocabulary\n\
         - Their relationships with other characters\n\
         - Their knowledge and experiences from the Harry Potter series\n\
         - Their personality traits and values",
        desc = character.description,
    );

    if let Some(notes) = non_blank(&settings.custom_description) {
        out.push_str(&format!("\n\nAdditional character notes: {notes}"));
    }
    if let Some(topics) = non_blank(&settings.favorite_topics) {
        out.push_str(&format!(
            "\n\nThis character particularly enjoys discussing: {topics}"
        ));
    }
    out.push_str(&format!(
        "\n\nThe character generally speaks in a {} tone.",
        settings.speaking_style.label()
    ));
    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
