//! Aralin: a learning backend for subjects, lessons, quizzes and flashcards
//! with model-generated content and spaced review.

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod generation;
pub mod handlers;
pub mod review;
pub mod server;

pub use config::AppConfig;
pub use content::{extract_and_validate, extract_json_array, ContentError, ContentKind, Extracted};
pub use db::{Database, StorageError};
pub use generation::{GeminiClient, GenerationError, GenerationService, TextGenerator};
pub use review::{schedule_next_review, Quality, ReviewSchedule};
pub use server::{start_server, AppState, ServerHandle};
