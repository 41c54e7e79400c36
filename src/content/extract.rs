//! Pulling a JSON array out of free-form model output
//!
//! The candidate span runs from the first `[` to the last `]` of the text.
//! When a response contains several bracketed fragments the span covers all of
//! them, which usually fails to parse; this is accepted behaviour and callers
//! see it as a parse error.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::*;

/// Why a single element failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    NotAnObject,
    MissingQuestion,
    OptionsNotFourStrings,
    DuplicateOptions,
    CorrectAnswerOutOfRange,
    MissingAnswer,
    NotAnArray,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotAnObject => "element is not an object",
            Self::MissingQuestion => "missing or invalid question",
            Self::OptionsNotFourStrings => "options must be an array with exactly 4 strings",
            Self::DuplicateOptions => "options must be distinct",
            Self::CorrectAnswerOutOfRange => "correct answer must be a valid index (0-3)",
            Self::MissingAnswer => "missing or invalid answer",
            Self::NotAnArray => "response is not a JSON array",
        };
        f.write_str(msg)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("No valid JSON array found in response")]
    Extraction,

    #[error("Response contains invalid JSON: {0}")]
    Parse(String),

    #[error("Invalid {kind} item at index {index}: {rule}")]
    Validation {
        kind: ContentKind,
        index: usize,
        rule: ValidationRule,
    },
}

pub type Result<T> = std::result::Result<T, ContentError>;

fn array_span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("Invalid regex"))
}

/// Locate the first-`[`-to-last-`]` span and check that it is valid JSON.
///
/// Returns the span text untouched, which is what gets archived.
pub fn extract_json_array(text: &str) -> Result<&str> {
    parse_span(text).map(|(span, _)| span)
}

/// Extract the embedded JSON array from `text` and validate every element
/// against `kind`.
pub fn extract_and_validate(text: &str, kind: ContentKind) -> Result<Extracted> {
    let (span, value) = parse_span(text)?;
    Ok(Extracted {
        items: validate_items(value, kind)?,
        raw_json: span.to_string(),
    })
}

fn parse_span(text: &str) -> Result<(&str, Value)> {
    let span = array_span_regex()
        .find(text)
        .ok_or(ContentError::Extraction)?
        .as_str();

    let value = serde_json::from_str(span).map_err(|e| ContentError::Parse(e.to_string()))?;
    Ok((span, value))
}

fn validate_items(value: Value, kind: ContentKind) -> Result<GeneratedItems> {
    // A bracket-delimited span that parses is always an array
    let Value::Array(elements) = value else {
        return Err(ContentError::Validation {
            kind,
            index: 0,
            rule: ValidationRule::NotAnArray,
        });
    };

    let items = match kind {
        ContentKind::Quiz => GeneratedItems::Quiz(
            elements
                .iter()
                .enumerate()
                .map(|(index, element)| validate_question(index, element))
                .collect::<Result<Vec<_>>>()?,
        ),
        ContentKind::Flashcards => GeneratedItems::Flashcards(
            elements
                .iter()
                .enumerate()
                .map(|(index, element)| validate_flashcard(index, element))
                .collect::<Result<Vec<_>>>()?,
        ),
    };
    Ok(items)
}

fn validate_question(index: usize, element: &Value) -> Result<GeneratedQuestion> {
    let fail = |rule| ContentError::Validation {
        kind: ContentKind::Quiz,
        index,
        rule,
    };

    let object = element.as_object().ok_or_else(|| fail(ValidationRule::NotAnObject))?;
    let question = non_empty_string(object, "question").ok_or_else(|| fail(ValidationRule::MissingQuestion))?;

    let options: Vec<String> = object
        .get("options")
        .and_then(Value::as_array)
        .filter(|options| options.len() == QUIZ_OPTION_COUNT)
        .and_then(|options| {
            options
                .iter()
                .map(|o| o.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| fail(ValidationRule::OptionsNotFourStrings))?;

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(fail(ValidationRule::DuplicateOptions));
    }

    let correct_answer = object
        .get("correctAnswer")
        .or_else(|| object.get("correctAnswerIndex"))
        .and_then(Value::as_u64)
        .filter(|&i| (i as usize) < QUIZ_OPTION_COUNT)
        .ok_or_else(|| fail(ValidationRule::CorrectAnswerOutOfRange))? as usize;

    Ok(GeneratedQuestion {
        question,
        options,
        correct_answer,
    })
}

fn validate_flashcard(index: usize, element: &Value) -> Result<GeneratedFlashcard> {
    let fail = |rule| ContentError::Validation {
        kind: ContentKind::Flashcards,
        index,
        rule,
    };

    let object = element.as_object().ok_or_else(|| fail(ValidationRule::NotAnObject))?;
    let question = non_empty_string(object, "question").ok_or_else(|| fail(ValidationRule::MissingQuestion))?;
    let answer = non_empty_string(object, "answer").ok_or_else(|| fail(ValidationRule::MissingAnswer))?;

    Ok(GeneratedFlashcard { question, answer })
}

/// A string field with at least one non-whitespace character
fn non_empty_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
