//! Data models for the spaced repetition system

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Ease factor given to an item the learner has never reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Interval given to an item the learner has never reviewed
pub const DEFAULT_INTERVAL_DAYS: u32 = 0;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Quality must be between 0 and 5, got {0}")]
    InvalidQuality(i64),

    #[error("Failed to update review progress: {0}")]
    Update(String),
}

/// Self-assessed recall quality
///
/// - 0: Complete blackout
/// - 1: Incorrect, but recognized on seeing the answer
/// - 2: Incorrect, but the answer seemed easy to recall
/// - 3: Correct with serious difficulty
/// - 4: Correct after hesitation
/// - 5: Perfect response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ReviewError> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ReviewError::InvalidQuality(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Responses of 3 and above count as a successful recall
    pub fn is_recalled(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<i64> for Quality {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A question/answer item attached to a lesson for spaced review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub question: String,
    pub answer: String,
}

/// A learner's schedule for one review item
///
/// Keyed by `(user_id, item_id)`; there is at most one record per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub user_id: Uuid,
    pub item_id: Uuid,
    /// Interval growth multiplier, never below 1.3
    pub ease_factor: f64,
    /// Current interval in days
    pub interval_days: u32,
    /// When the item is due again
    pub next_review_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Check if the item is due for review at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_at
    }
}

/// A review item together with the learner's record, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueItem {
    pub item: ReviewItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ReviewRecord>,
}
