//! Quiz and flashcard generation endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{ApiError, ApiResult, Session};
use crate::content::{ContentKind, Extracted, GeneratedItems};
use crate::db::{Lesson, Subject};
use crate::server::AppState;

const DEFAULT_COUNT: usize = 5;
const MAX_COUNT: usize = 50;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub kind: ContentKind,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub grade_level: Option<u8>,
    #[serde(default)]
    pub additional_content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub document_text: String,
    #[serde(default)]
    pub count: Option<usize>,
    pub grade_level: u8,
}

#[derive(Deserialize)]
pub struct RawRequest {
    pub prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub items: GeneratedItems,
    pub raw_json: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<Uuid>,
}

fn check_count(count: Option<usize>) -> ApiResult<usize> {
    let count = count.unwrap_or(DEFAULT_COUNT);
    if (1..=MAX_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(ApiError::BadRequest(format!("count must be between 1 and {}", MAX_COUNT)))
    }
}

/// Load the lesson and its subject, checking that the caller owns the lesson
fn owned_lesson(state: &AppState, session: &Session, lesson_id: Uuid) -> ApiResult<(Lesson, Subject)> {
    let db = state.db()?;
    let lesson = db.get_lesson(lesson_id)?;
    session.require_owner(lesson.teacher_id)?;
    let subject = db.get_subject(lesson.subject_id)?;
    Ok((lesson, subject))
}

/// Persist validated items for a lesson and archive the raw JSON
fn save_generated(state: &AppState, lesson: &Lesson, extracted: Extracted) -> ApiResult<GenerateResponse> {
    let quiz = state
        .db()?
        .save_generated_output(lesson.subject_id, lesson.id, &extracted)?;

    Ok(GenerateResponse {
        items: extracted.items,
        raw_json: extracted.raw_json,
        quiz_id: quiz.map(|q| q.id),
    })
}

/// Generate a MELC-based quiz or flashcard set for a lesson.
///
/// The grade defaults to the lowest grade the subject suits. Stored MELCs for
/// that grade and subject are added to the prompt.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let count = check_count(request.count)?;
    let (lesson, subject) = owned_lesson(&state, &session, lesson_id)?;

    let grade = request
        .grade_level
        .or_else(|| subject.suitable_grades.iter().min().copied())
        .ok_or_else(|| ApiError::BadRequest("gradeLevel is required".to_string()))?;

    let mut additional = request.additional_content.unwrap_or_default();
    let competencies = state.db()?.melcs_for(grade, &subject.name)?;
    if !competencies.is_empty() {
        additional.push_str("\n\nCompetencies:\n");
        for melc in &competencies {
            additional.push_str(&format!("- {}\n", melc.competency));
        }
    }

    log::info!(
        "Generating {} {} for lesson {} (grade {})",
        count,
        request.kind,
        lesson.id,
        grade
    );
    let extracted = match request.kind {
        ContentKind::Quiz => {
            state
                .generation
                .generate_quiz_from_melcs(&subject.name, grade, count, &additional)
                .await?
        }
        ContentKind::Flashcards => {
            state
                .generation
                .generate_flashcards(&subject.name, grade, count, &additional)
                .await?
        }
    };

    Ok(Json(save_generated(&state, &lesson, extracted)?))
}

/// Generate a quiz from curriculum text extracted from a document
pub async fn generate_from_document(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
    Json(request): Json<DocumentRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let count = check_count(request.count)?;
    if request.document_text.trim().is_empty() {
        return Err(ApiError::BadRequest("documentText is required".to_string()));
    }
    let (lesson, subject) = owned_lesson(&state, &session, lesson_id)?;

    let extracted = state
        .generation
        .generate_quiz_from_document(&request.document_text, &subject.name, request.grade_level, count)
        .await?;

    Ok(Json(save_generated(&state, &lesson, extracted)?))
}

/// Run an arbitrary prompt and return the JSON array found in the output
pub async fn generate_raw(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(request): Json<RawRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    session.require_teacher()?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }

    let result = state.generation.generate_raw(&request.prompt).await?;
    Ok(Json(json!({
        "result": result,
        "metadata": { "success": true }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GeneratedFlashcard;

    #[test]
    fn test_check_count() {
        assert_eq!(check_count(None).unwrap(), DEFAULT_COUNT);
        assert_eq!(check_count(Some(10)).unwrap(), 10);
        assert!(matches!(check_count(Some(0)), Err(ApiError::BadRequest(_))));
        assert!(matches!(check_count(Some(MAX_COUNT + 1)), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_response_shape() {
        let response = GenerateResponse {
            items: GeneratedItems::Flashcards(vec![GeneratedFlashcard {
                question: "q".to_string(),
                answer: "a".to_string(),
            }]),
            raw_json: "[]".to_string(),
            quiz_id: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["kind"], "flashcards");
        assert_eq!(value["items"][0]["answer"], "a");
        assert_eq!(value["rawJson"], "[]");
        assert!(value.get("quizId").is_none());
    }
}
