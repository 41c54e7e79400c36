//! Subjects, lessons, lesson materials and learning competencies

use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::database::{get_json, get_parsed, get_uuid, Database, Result, StorageError};
use super::models::{Lesson, Material, Melc, NewMaterial, Subject};

fn subject_from_row(row: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        suitable_grades: get_json(row, 2)?,
        teacher_id: get_uuid(row, 3)?,
    })
}

fn lesson_from_row(row: &Row) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: get_uuid(row, 0)?,
        title: row.get(1)?,
        subject_id: get_uuid(row, 2)?,
        teacher_id: get_uuid(row, 3)?,
    })
}

fn material_from_row(row: &Row) -> rusqlite::Result<Material> {
    Ok(Material {
        id: get_uuid(row, 0)?,
        lesson_id: get_uuid(row, 1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        kind: get_parsed(row, 4)?,
        order_index: row.get(5)?,
    })
}

fn melc_from_row(row: &Row) -> rusqlite::Result<Melc> {
    Ok(Melc {
        id: get_uuid(row, 0)?,
        grade_level: row.get(1)?,
        subject: row.get(2)?,
        competency: row.get(3)?,
    })
}

impl Database {
    // ===== Subject Operations =====

    pub fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, suitable_grades, teacher_id FROM subjects ORDER BY name")?;
        let subjects = stmt
            .query_map([], subject_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(subjects)
    }

    /// Subjects whose suitable grades include `grade_level`
    pub fn subjects_for_grade(&self, grade_level: u8) -> Result<Vec<Subject>> {
        let subjects = self.list_subjects()?;
        Ok(subjects
            .into_iter()
            .filter(|s| s.suitable_grades.contains(&grade_level))
            .collect())
    }

    pub fn subjects_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Subject>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, suitable_grades, teacher_id FROM subjects WHERE teacher_id = ?1 ORDER BY name",
        )?;
        let subjects = stmt
            .query_map(params![teacher_id.to_string()], subject_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(subjects)
    }

    pub fn get_subject(&self, id: Uuid) -> Result<Subject> {
        self.conn
            .query_row(
                "SELECT id, name, suitable_grades, teacher_id FROM subjects WHERE id = ?1",
                params![id.to_string()],
                subject_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Subject {}", id)))
    }

    pub fn create_subject(&self, name: String, suitable_grades: Vec<u8>, teacher_id: Uuid) -> Result<Subject> {
        if name.trim().is_empty() {
            return Err(StorageError::InvalidInput("subject name must not be empty".to_string()));
        }
        if suitable_grades.is_empty() {
            return Err(StorageError::InvalidInput("at least one grade level is required".to_string()));
        }

        let subject = Subject {
            id: Uuid::new_v4(),
            name,
            suitable_grades,
            teacher_id,
        };

        self.conn.execute(
            "INSERT INTO subjects (id, name, suitable_grades, teacher_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                subject.id.to_string(),
                subject.name,
                serde_json::to_string(&subject.suitable_grades)?,
                subject.teacher_id.to_string(),
            ],
        )?;

        Ok(subject)
    }

    // ===== Lesson Operations =====

    pub fn lessons_for_subject(&self, subject_id: Uuid) -> Result<Vec<Lesson>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, subject_id, teacher_id FROM lessons WHERE subject_id = ?1 ORDER BY rowid",
        )?;
        let lessons = stmt
            .query_map(params![subject_id.to_string()], lesson_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lessons)
    }

    pub fn get_lesson(&self, id: Uuid) -> Result<Lesson> {
        self.conn
            .query_row(
                "SELECT id, title, subject_id, teacher_id FROM lessons WHERE id = ?1",
                params![id.to_string()],
                lesson_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Lesson {}", id)))
    }

    pub fn create_lesson(&self, title: String, subject_id: Uuid, teacher_id: Uuid) -> Result<Lesson> {
        if title.trim().is_empty() {
            return Err(StorageError::InvalidInput("lesson title must not be empty".to_string()));
        }
        // Surface a missing subject as NotFound rather than a foreign key failure
        self.get_subject(subject_id)?;

        let lesson = Lesson {
            id: Uuid::new_v4(),
            title,
            subject_id,
            teacher_id,
        };

        self.conn.execute(
            "INSERT INTO lessons (id, title, subject_id, teacher_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                lesson.id.to_string(),
                lesson.title,
                lesson.subject_id.to_string(),
                lesson.teacher_id.to_string(),
            ],
        )?;

        Ok(lesson)
    }

    // ===== Material Operations =====

    pub fn materials_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Material>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, lesson_id, title, content, type, order_index FROM materials
             WHERE lesson_id = ?1 ORDER BY order_index, rowid",
        )?;
        let materials = stmt
            .query_map(params![lesson_id.to_string()], material_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(materials)
    }

    pub fn create_material(&self, lesson_id: Uuid, new_material: NewMaterial) -> Result<Material> {
        self.get_lesson(lesson_id)?;

        let material = Material {
            id: Uuid::new_v4(),
            lesson_id,
            title: new_material.title,
            content: new_material.content,
            kind: new_material.kind,
            order_index: new_material.order_index,
        };

        self.conn.execute(
            "INSERT INTO materials (id, lesson_id, title, content, type, order_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                material.id.to_string(),
                material.lesson_id.to_string(),
                material.title,
                material.content,
                material.kind.as_str(),
                material.order_index,
            ],
        )?;

        Ok(material)
    }

    // ===== MELC Operations =====

    pub fn melcs_for(&self, grade_level: u8, subject: &str) -> Result<Vec<Melc>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, grade_level, subject, competency FROM melcs
             WHERE grade_level = ?1 AND subject = ?2 ORDER BY rowid",
        )?;
        let melcs = stmt
            .query_map(params![grade_level, subject], melc_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(melcs)
    }

    pub fn add_melc(&self, grade_level: u8, subject: String, competency: String) -> Result<Melc> {
        let melc = Melc {
            id: Uuid::new_v4(),
            grade_level,
            subject,
            competency,
        };

        self.conn.execute(
            "INSERT INTO melcs (id, grade_level, subject, competency) VALUES (?1, ?2, ?3, ?4)",
            params![melc.id.to_string(), melc.grade_level, melc.subject, melc.competency],
        )?;

        Ok(melc)
    }
}
