//! Quizzes, attempts and flashcards

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, Session};
use crate::db::{Flashcard, Quiz, QuizQuestion, QuizResult};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct AttemptRequest {
    /// Chosen option text, in question order
    pub answers: Vec<String>,
}

pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Quiz>>> {
    let db = state.db()?;
    db.get_lesson(lesson_id)?;
    Ok(Json(db.quizzes_for_lesson(lesson_id)?))
}

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<Json<Vec<QuizQuestion>>> {
    let db = state.db()?;
    db.get_quiz(quiz_id)?;
    Ok(Json(db.questions_for_quiz(quiz_id)?))
}

/// Grade the answers, record the attempt and return the result
pub async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(quiz_id): Path<Uuid>,
    Json(request): Json<AttemptRequest>,
) -> ApiResult<Json<QuizResult>> {
    let db = state.db()?;
    let result = db.grade_quiz(quiz_id, &request.answers)?;
    db.submit_quiz_attempt(quiz_id, session.user_id, result.score)?;
    log::info!(
        "User {} scored {}/{} on quiz {}",
        session.user_id,
        result.score,
        result.total,
        quiz_id
    );
    Ok(Json(result))
}

pub async fn list_flashcards(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Flashcard>>> {
    let db = state.db()?;
    db.get_lesson(lesson_id)?;
    Ok(Json(db.flashcards_for_lesson(lesson_id)?))
}
