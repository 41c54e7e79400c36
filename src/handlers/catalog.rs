//! Subjects, lessons, materials and MELCs

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ApiResult, Session};
use crate::db::{Lesson, Material, Melc, NewMaterial, Subject};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct GradeQuery {
    pub grade: Option<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubjectRequest {
    pub name: String,
    pub suitable_grades: Vec<u8>,
}

#[derive(Deserialize)]
pub struct NewLessonRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct MelcQuery {
    pub grade: u8,
    pub subject: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMelcRequest {
    pub grade_level: u8,
    pub subject: String,
    pub competency: String,
}

// ===== Subjects =====

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Query(query): Query<GradeQuery>,
) -> ApiResult<Json<Vec<Subject>>> {
    let db = state.db()?;
    let subjects = match query.grade {
        Some(grade) => db.subjects_for_grade(grade)?,
        None => db.list_subjects()?,
    };
    Ok(Json(subjects))
}

pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(request): Json<NewSubjectRequest>,
) -> ApiResult<Json<Subject>> {
    session.require_teacher()?;
    let subject = state
        .db()?
        .create_subject(request.name, request.suitable_grades, session.user_id)?;
    Ok(Json(subject))
}

pub async fn teacher_subjects(State(state): State<Arc<AppState>>, session: Session) -> ApiResult<Json<Vec<Subject>>> {
    session.require_teacher()?;
    Ok(Json(state.db()?.subjects_for_teacher(session.user_id)?))
}

// ===== Lessons =====

pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(subject_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Lesson>>> {
    let db = state.db()?;
    db.get_subject(subject_id)?;
    Ok(Json(db.lessons_for_subject(subject_id)?))
}

pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<NewLessonRequest>,
) -> ApiResult<Json<Lesson>> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Lesson title is required".to_string()));
    }

    let db = state.db()?;
    let subject = db.get_subject(subject_id)?;
    session.require_owner(subject.teacher_id)?;
    Ok(Json(db.create_lesson(request.title, subject_id, session.user_id)?))
}

// ===== Materials =====

pub async fn list_materials(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Material>>> {
    let db = state.db()?;
    db.get_lesson(lesson_id)?;
    Ok(Json(db.materials_for_lesson(lesson_id)?))
}

pub async fn create_material(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(lesson_id): Path<Uuid>,
    Json(material): Json<NewMaterial>,
) -> ApiResult<Json<Material>> {
    let db = state.db()?;
    let lesson = db.get_lesson(lesson_id)?;
    session.require_owner(lesson.teacher_id)?;
    Ok(Json(db.create_material(lesson_id, material)?))
}

// ===== MELCs =====

pub async fn list_melcs(
    State(state): State<Arc<AppState>>,
    _session: Session,
    Query(query): Query<MelcQuery>,
) -> ApiResult<Json<Vec<Melc>>> {
    Ok(Json(state.db()?.melcs_for(query.grade, &query.subject)?))
}

pub async fn create_melc(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(request): Json<NewMelcRequest>,
) -> ApiResult<Json<Melc>> {
    session.require_teacher()?;
    let melc = state
        .db()?
        .add_melc(request.grade_level, request.subject, request.competency)?;
    Ok(Json(melc))
}
