//! Spaced repetition for lesson review items
//!
//! This module provides:
//! - The review-item and review-record models
//! - The SM-2 style schedule update applied on every review response

pub mod algorithm;
pub mod models;

pub use algorithm::{schedule_next_review, ReviewSchedule, MAX_INTERVAL_DAYS};
pub use models::*;
