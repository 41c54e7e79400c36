//! Review items, per-learner review records and lesson progress

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::database::{get_parsed, get_time, get_uuid, ts, Database, Result, StorageError};
use super::models::{Progress, ProgressStatus};
use crate::review::{
    schedule_next_review, DueItem, Quality, ReviewError, ReviewItem, ReviewRecord, DEFAULT_EASE_FACTOR,
    DEFAULT_INTERVAL_DAYS,
};

fn item_from_row(row: &Row) -> rusqlite::Result<ReviewItem> {
    Ok(ReviewItem {
        id: get_uuid(row, 0)?,
        lesson_id: get_uuid(row, 1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
    })
}

fn record_from_row(row: &Row) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        user_id: get_uuid(row, 0)?,
        item_id: get_uuid(row, 1)?,
        ease_factor: row.get(2)?,
        interval_days: row.get(3)?,
        next_review_at: get_time(row, 4)?,
        updated_at: get_time(row, 5)?,
    })
}

fn progress_from_row(row: &Row) -> rusqlite::Result<Progress> {
    Ok(Progress {
        user_id: get_uuid(row, 0)?,
        lesson_id: get_uuid(row, 1)?,
        status: get_parsed(row, 2)?,
        last_updated: get_time(row, 3)?,
    })
}

const RECORD_COLUMNS: &str = "user_id, item_id, ease_factor, interval_days, next_review_at, updated_at";

impl Database {
    // ===== Review Item Operations =====

    pub fn create_review_item(&self, lesson_id: Uuid, question: String, answer: String) -> Result<ReviewItem> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "review items need a question and an answer".to_string(),
            ));
        }
        self.get_lesson(lesson_id)?;

        let item = ReviewItem {
            id: Uuid::new_v4(),
            lesson_id,
            question,
            answer,
        };

        self.conn.execute(
            "INSERT INTO spaced_repetition_items (id, lesson_id, question, answer) VALUES (?1, ?2, ?3, ?4)",
            params![item.id.to_string(), item.lesson_id.to_string(), item.question, item.answer],
        )?;

        Ok(item)
    }

    pub fn get_review_item(&self, id: Uuid) -> Result<ReviewItem> {
        self.conn
            .query_row(
                "SELECT id, lesson_id, question, answer FROM spaced_repetition_items WHERE id = ?1",
                params![id.to_string()],
                item_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Review item {}", id)))
    }

    pub fn review_items_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<ReviewItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, lesson_id, question, answer FROM spaced_repetition_items
             WHERE lesson_id = ?1 ORDER BY rowid",
        )?;
        let items = stmt
            .query_map(params![lesson_id.to_string()], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    // ===== Review Record Operations =====

    pub fn review_progress_for_user(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM spaced_repetition_progress WHERE user_id = ?1 ORDER BY next_review_at",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![user_id.to_string()], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn get_review_record(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<ReviewRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM spaced_repetition_progress WHERE user_id = ?1 AND item_id = ?2",
                    RECORD_COLUMNS
                ),
                params![user_id.to_string(), item_id.to_string()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert or replace the record keyed by `(user_id, item_id)`. Last write wins.
    pub fn upsert_review_record(&self, record: &ReviewRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO spaced_repetition_progress
                 (user_id, item_id, ease_factor, interval_days, next_review_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, item_id) DO UPDATE SET
                 ease_factor = excluded.ease_factor,
                 interval_days = excluded.interval_days,
                 next_review_at = excluded.next_review_at,
                 updated_at = excluded.updated_at",
            params![
                record.user_id.to_string(),
                record.item_id.to_string(),
                record.ease_factor,
                record.interval_days,
                ts(&record.next_review_at),
                ts(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Apply one review response and persist the new schedule.
    ///
    /// Items never reviewed start from the default ease factor and interval.
    pub fn record_review(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> std::result::Result<ReviewRecord, ReviewError> {
        let prior = self
            .get_review_record(user_id, item_id)
            .map_err(|e| ReviewError::Update(e.to_string()))?;

        let (ease_factor, interval_days) = prior
            .as_ref()
            .map_or((DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL_DAYS), |r| (r.ease_factor, r.interval_days));

        let schedule = schedule_next_review(quality, ease_factor, interval_days, now);
        let record = ReviewRecord {
            user_id,
            item_id,
            ease_factor: schedule.ease_factor,
            interval_days: schedule.interval_days,
            next_review_at: schedule.next_review_at,
            updated_at: now,
        };

        self.upsert_review_record(&record)
            .map_err(|e| ReviewError::Update(e.to_string()))?;

        log::debug!(
            "Review of item {} by {}: quality {}, ease {:.2}, interval {}d",
            item_id,
            user_id,
            quality,
            record.ease_factor,
            record.interval_days
        );
        Ok(record)
    }

    /// Review items of a lesson that are due at `now`, oldest first.
    ///
    /// Items the learner has never reviewed are always due and come first.
    pub fn due_items(&self, user_id: Uuid, lesson_id: Uuid, now: DateTime<Utc>) -> Result<Vec<DueItem>> {
        let mut due = Vec::new();
        for item in self.review_items_for_lesson(lesson_id)? {
            let record = self.get_review_record(user_id, item.id)?;
            if record.as_ref().map_or(true, |r| r.is_due(now)) {
                due.push(DueItem { item, record });
            }
        }

        // Stable sort keeps unreviewed items in creation order
        due.sort_by_key(|d| d.record.as_ref().map(|r| r.next_review_at));
        Ok(due)
    }

    // ===== Lesson Progress Operations =====

    pub fn update_progress(&self, user_id: Uuid, lesson_id: Uuid, status: ProgressStatus) -> Result<Progress> {
        self.get_lesson(lesson_id)?;

        let progress = Progress {
            user_id,
            lesson_id,
            status,
            last_updated: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO progress (user_id, lesson_id, status, last_updated) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                 status = excluded.status,
                 last_updated = excluded.last_updated",
            params![
                progress.user_id.to_string(),
                progress.lesson_id.to_string(),
                progress.status.as_str(),
                ts(&progress.last_updated),
            ],
        )?;

        Ok(progress)
    }

    pub fn progress_for_user(&self, user_id: Uuid) -> Result<Vec<Progress>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, lesson_id, status, last_updated FROM progress
             WHERE user_id = ?1 ORDER BY last_updated DESC",
        )?;
        let progress = stmt
            .query_map(params![user_id.to_string()], progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(progress)
    }
}
