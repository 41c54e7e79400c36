//! Content generation through a hosted text model
//!
//! A [`TextGenerator`] turns a prompt into raw text. [`GenerationService`]
//! builds the prompts for quizzes and flashcards, makes exactly one
//! generation call per request and runs the output through the content
//! extractor.

pub mod client;
pub mod prompts;
pub mod service;

use thiserror::Error;

use crate::content::ContentError;

pub use client::{GeminiClient, TextGenerator};
pub use service::GenerationService;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("The model returned no text")]
    EmptyResponse,

    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error(transparent)]
    Content(#[from] ContentError),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
