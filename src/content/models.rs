//! Data models for generated quiz and flashcard content

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of options every generated quiz question must carry
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Which shape of content a model response is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Quiz,
    Flashcards,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Flashcards => "flashcards",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quiz" => Ok(Self::Quiz),
            "flashcards" | "flashcard" => Ok(Self::Flashcards),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

/// A validated multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct choice
    pub correct_answer: usize,
}

impl GeneratedQuestion {
    /// Text of the correct option
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer]
    }
}

/// A validated question/answer flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFlashcard {
    pub question: String,
    pub answer: String,
}

/// Validated items, tagged by the kind they were checked against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum GeneratedItems {
    Quiz(Vec<GeneratedQuestion>),
    Flashcards(Vec<GeneratedFlashcard>),
}

impl GeneratedItems {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Quiz(_) => ContentKind::Quiz,
            Self::Flashcards(_) => ContentKind::Flashcards,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Quiz(items) => items.len(),
            Self::Flashcards(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a successful extraction: the typed items plus the exact JSON
/// text they were parsed from, kept for archiving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extracted {
    pub items: GeneratedItems,
    pub raw_json: String,
}
