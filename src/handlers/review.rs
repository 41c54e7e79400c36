//! Spaced review and lesson progress

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, Session};
use crate::db::{Progress, ProgressStatus};
use crate::review::{DueItem, Quality, ReviewItem, ReviewRecord};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct NewItemRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ResponseRequest {
    /// Checked against 0..=5 by `Quality::new`
    pub quality: i64,
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub status: ProgressStatus,
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewItem>>> {
    let db = state.db()?;
    db.get_lesson(lesson_id)?;
    Ok(Json(db.review_items_for_lesson(lesson_id)?))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
    Json(request): Json<NewItemRequest>,
) -> ApiResult<Json<ReviewItem>> {
    let db = state.db()?;
    let lesson = db.get_lesson(lesson_id)?;
    session.require_owner(lesson.teacher_id)?;
    Ok(Json(db.create_review_item(lesson_id, request.question, request.answer)?))
}

pub async fn due_items(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DueItem>>> {
    let db = state.db()?;
    db.get_lesson(lesson_id)?;
    Ok(Json(db.due_items(session.user_id, lesson_id, Utc::now())?))
}

pub async fn respond(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(item_id): Path<Uuid>,
    Json(request): Json<ResponseRequest>,
) -> ApiResult<Json<ReviewRecord>> {
    let quality = Quality::new(request.quality)?;

    let db = state.db()?;
    db.get_review_item(item_id)?;
    Ok(Json(db.record_review(session.user_id, item_id, quality, Utc::now())?))
}

pub async fn list_progress(State(state): State<Arc<AppState>>, session: Session) -> ApiResult<Json<Vec<Progress>>> {
    Ok(Json(state.db()?.progress_for_user(session.user_id)?))
}

pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
    Json(request): Json<ProgressRequest>,
) -> ApiResult<Json<Progress>> {
    let progress = state
        .db()?
        .update_progress(session.user_id, lesson_id, request.status)?;
    Ok(Json(progress))
}
