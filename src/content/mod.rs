//! Extraction and validation of generated lesson content
//!
//! Language models are asked to answer with a bare JSON array but routinely
//! wrap it in prose. This module pulls the array out of the response text and
//! checks every element against the shape expected for the requested kind:
//! - Multiple-choice quiz questions (4 options, correct index 0-3)
//! - Question/answer flashcards

pub mod extract;
pub mod models;

pub use extract::{extract_and_validate, extract_json_array, ContentError, ValidationRule};
pub use models::*;
