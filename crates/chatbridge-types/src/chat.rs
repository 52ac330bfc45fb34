//! Chat-level domain types: turns, language tags, prompts, and chunks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A turn in the chat history has the same shape as an LLM message.
pub type ChatTurn = crate::llm::Message;

/// Suffix appended by the speech recognizer when it auto-detected the language.
const AUTO_SUFFIX: &str = "-auto";

/// Language a reply should be written in.
///
/// Parsed from the two-letter tags produced by the speech-recognition stage
/// (`en`, `fr`, `es`, `zh`, `ja`, `ko`), optionally suffixed with `-auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Spanish,
    Chinese,
    Japanese,
    Korean,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::French,
        Language::Spanish,
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
    ];

    /// The short tag for this language (e.g. `en`).
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::French => write!(f, "french"),
            Language::Spanish => write!(f, "spanish"),
            Language::Chinese => write!(f, "chinese"),
            Language::Japanese => write!(f, "japanese"),
            Language::Korean => write!(f, "korean"),
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let tag = trimmed.strip_suffix(AUTO_SUFFIX).unwrap_or(trimmed);
        let tag = tag.to_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.tag() == tag)
            .ok_or_else(|| ConfigError::UnknownLanguage(s.to_string()))
    }
}

/// A prompt submitted to the processing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub language: Option<Language>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::new(text)
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::new(text)
    }
}

/// A unit of reply text handed back to the caller.
///
/// Every chunk but the last is sentence-terminated; the final chunk is
/// whatever remained buffered when the stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    pub text: String,
    pub language: Option<Language>,
    pub is_final: bool,
}
