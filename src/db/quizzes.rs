//! Quizzes, quiz attempts, flashcards and the generated-content archive

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::database::{get_json, get_parsed, get_time, get_uuid, ts, Database, Result, StorageError};
use super::models::{Flashcard, GeneratedContent, Quiz, QuizAttempt, QuizQuestion, QuizResult};
use crate::content::{ContentKind, Extracted, GeneratedFlashcard, GeneratedItems, GeneratedQuestion};

/// Title given to quizzes saved from model output
pub const GENERATED_QUIZ_TITLE: &str = "AI Generated Quiz";

fn quiz_from_row(row: &Row) -> rusqlite::Result<Quiz> {
    Ok(Quiz {
        id: get_uuid(row, 0)?,
        lesson_id: get_uuid(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        is_ai_generated: row.get(4)?,
        created_at: get_time(row, 5)?,
    })
}

fn question_from_row(row: &Row) -> rusqlite::Result<QuizQuestion> {
    Ok(QuizQuestion {
        id: get_uuid(row, 0)?,
        quiz_id: get_uuid(row, 1)?,
        question: row.get(2)?,
        options: get_json(row, 3)?,
        correct_answer: row.get(4)?,
        order_index: row.get(5)?,
        is_ai_generated: row.get(6)?,
    })
}

fn attempt_from_row(row: &Row) -> rusqlite::Result<QuizAttempt> {
    Ok(QuizAttempt {
        id: get_uuid(row, 0)?,
        quiz_id: get_uuid(row, 1)?,
        user_id: get_uuid(row, 2)?,
        score: row.get(3)?,
        completed_at: get_time(row, 4)?,
    })
}

fn flashcard_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: get_uuid(row, 0)?,
        lesson_id: get_uuid(row, 1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        is_ai_generated: row.get(4)?,
        created_at: get_time(row, 5)?,
    })
}

fn generated_content_from_row(row: &Row) -> rusqlite::Result<GeneratedContent> {
    Ok(GeneratedContent {
        id: get_uuid(row, 0)?,
        subject_id: get_uuid(row, 1)?,
        lesson_id: get_uuid(row, 2)?,
        kind: get_parsed(row, 3)?,
        content: row.get(4)?,
        created_at: get_time(row, 5)?,
    })
}

impl Database {
    // ===== Quiz Operations =====

    pub fn create_quiz(&self, lesson_id: Uuid, title: String, description: Option<String>) -> Result<Quiz> {
        self.get_lesson(lesson_id)?;
        insert_quiz(&self.conn, lesson_id, title, description, false)
    }

    pub fn get_quiz(&self, id: Uuid) -> Result<Quiz> {
        self.conn
            .query_row(
                "SELECT id, lesson_id, title, description, is_ai_generated, created_at FROM quizzes WHERE id = ?1",
                params![id.to_string()],
                quiz_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Quiz {}", id)))
    }

    pub fn quizzes_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Quiz>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, lesson_id, title, description, is_ai_generated, created_at FROM quizzes
             WHERE lesson_id = ?1 ORDER BY created_at",
        )?;
        let quizzes = stmt
            .query_map(params![lesson_id.to_string()], quiz_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quizzes)
    }

    /// Add a question written by hand. `correct_answer` must be one of `options`.
    pub fn create_quiz_question(
        &self,
        quiz_id: Uuid,
        question: String,
        options: Vec<String>,
        correct_answer: String,
        order_index: i64,
    ) -> Result<QuizQuestion> {
        if !options.contains(&correct_answer) {
            return Err(StorageError::InvalidInput(
                "correct answer must be one of the options".to_string(),
            ));
        }
        self.get_quiz(quiz_id)?;

        let question = QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id,
            question,
            options,
            correct_answer,
            order_index,
            is_ai_generated: false,
        };
        insert_question(&self.conn, &question)?;
        Ok(question)
    }

    pub fn questions_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<QuizQuestion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, quiz_id, question, options, correct_answer, order_index, is_ai_generated
             FROM quiz_questions WHERE quiz_id = ?1 ORDER BY order_index, rowid",
        )?;
        let questions = stmt
            .query_map(params![quiz_id.to_string()], question_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }

    /// Store validated model output as a new quiz. The quiz and all of its
    /// questions are written in one transaction.
    pub fn save_generated_quiz(&self, lesson_id: Uuid, questions: &[GeneratedQuestion]) -> Result<Quiz> {
        self.get_lesson(lesson_id)?;

        let tx = self.conn.unchecked_transaction()?;
        let quiz = insert_generated_quiz(&tx, lesson_id, questions)?;
        tx.commit()?;

        log::info!("Saved generated quiz {} with {} questions", quiz.id, questions.len());
        Ok(quiz)
    }

    /// Score `answers` (option text, in question order) against a quiz.
    /// Missing answers count as wrong.
    pub fn grade_quiz(&self, quiz_id: Uuid, answers: &[String]) -> Result<QuizResult> {
        let questions = self.questions_for_quiz(quiz_id)?;
        if questions.is_empty() {
            // Distinguish an unknown quiz from an empty one
            self.get_quiz(quiz_id)?;
        }

        let correct: Vec<bool> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| answers.get(i).map_or(false, |a| *a == q.correct_answer))
            .collect();

        Ok(QuizResult {
            score: correct.iter().filter(|c| **c).count() as u32,
            total: questions.len() as u32,
            correct,
        })
    }

    pub fn submit_quiz_attempt(&self, quiz_id: Uuid, user_id: Uuid, score: u32) -> Result<QuizAttempt> {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id,
            user_id,
            score,
            completed_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO quiz_attempts (id, quiz_id, user_id, score, completed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                attempt.id.to_string(),
                attempt.quiz_id.to_string(),
                attempt.user_id.to_string(),
                attempt.score,
                ts(&attempt.completed_at),
            ],
        )?;

        Ok(attempt)
    }

    pub fn attempts_for_user(&self, user_id: Uuid) -> Result<Vec<QuizAttempt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, quiz_id, user_id, score, completed_at FROM quiz_attempts
             WHERE user_id = ?1 ORDER BY completed_at DESC",
        )?;
        let attempts = stmt
            .query_map(params![user_id.to_string()], attempt_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }

    // ===== Flashcard Operations =====

    pub fn flashcards_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Flashcard>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, lesson_id, question, answer, is_ai_generated, created_at FROM flashcards
             WHERE lesson_id = ?1 ORDER BY created_at, rowid",
        )?;
        let cards = stmt
            .query_map(params![lesson_id.to_string()], flashcard_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub fn save_generated_flashcards(&self, lesson_id: Uuid, cards: &[GeneratedFlashcard]) -> Result<Vec<Flashcard>> {
        self.get_lesson(lesson_id)?;

        let tx = self.conn.unchecked_transaction()?;
        let saved = insert_generated_flashcards(&tx, lesson_id, cards)?;
        tx.commit()?;

        log::info!("Saved {} generated flashcards for lesson {}", saved.len(), lesson_id);
        Ok(saved)
    }

    // ===== Generated Content Archive =====

    pub fn save_generated_content(
        &self,
        subject_id: Uuid,
        lesson_id: Uuid,
        kind: ContentKind,
        raw_json: String,
    ) -> Result<GeneratedContent> {
        insert_generated_content(&self.conn, subject_id, lesson_id, kind, raw_json)
    }

    /// Store validated model output for a lesson as a quiz or flashcards and
    /// archive its raw JSON. Nothing is written unless every row is.
    ///
    /// Returns the new quiz for quiz output.
    pub fn save_generated_output(&self, subject_id: Uuid, lesson_id: Uuid, extracted: &Extracted) -> Result<Option<Quiz>> {
        self.get_lesson(lesson_id)?;

        let tx = self.conn.unchecked_transaction()?;
        let quiz = match &extracted.items {
            GeneratedItems::Quiz(questions) => Some(insert_generated_quiz(&tx, lesson_id, questions)?),
            GeneratedItems::Flashcards(cards) => {
                insert_generated_flashcards(&tx, lesson_id, cards)?;
                None
            }
        };
        let archived = insert_generated_content(
            &tx,
            subject_id,
            lesson_id,
            extracted.items.kind(),
            extracted.raw_json.clone(),
        )?;
        tx.commit()?;

        log::info!(
            "Saved {} generated {} for lesson {} (archive {})",
            extracted.items.len(),
            archived.kind,
            lesson_id,
            archived.id
        );
        Ok(quiz)
    }

    /// Archived output for a lesson, newest first
    pub fn generated_content_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<GeneratedContent>> {
        self.query_generated_content("lesson_id", lesson_id)
    }

    /// Archived output for a subject, newest first
    pub fn generated_content_for_subject(&self, subject_id: Uuid) -> Result<Vec<GeneratedContent>> {
        self.query_generated_content("subject_id", subject_id)
    }

    fn query_generated_content(&self, column: &str, id: Uuid) -> Result<Vec<GeneratedContent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, subject_id, lesson_id, type, content, created_at FROM ai_generated_content
             WHERE {} = ?1 ORDER BY created_at DESC, rowid DESC",
            column
        ))?;
        let rows = stmt
            .query_map(params![id.to_string()], generated_content_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn insert_quiz(
    conn: &Connection,
    lesson_id: Uuid,
    title: String,
    description: Option<String>,
    is_ai_generated: bool,
) -> Result<Quiz> {
    let quiz = Quiz {
        id: Uuid::new_v4(),
        lesson_id,
        title,
        description,
        is_ai_generated,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO quizzes (id, lesson_id, title, description, is_ai_generated, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            quiz.id.to_string(),
            quiz.lesson_id.to_string(),
            quiz.title,
            quiz.description,
            quiz.is_ai_generated,
            ts(&quiz.created_at),
        ],
    )?;

    Ok(quiz)
}

fn insert_generated_quiz(conn: &Connection, lesson_id: Uuid, questions: &[GeneratedQuestion]) -> Result<Quiz> {
    let quiz = insert_quiz(conn, lesson_id, GENERATED_QUIZ_TITLE.to_string(), None, true)?;

    for (index, generated) in questions.iter().enumerate() {
        let correct = generated.options.get(generated.correct_answer).ok_or_else(|| {
            StorageError::InvalidInput(format!("question {} has no option {}", index, generated.correct_answer))
        })?;
        let question = QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            question: generated.question.clone(),
            options: generated.options.clone(),
            correct_answer: correct.clone(),
            order_index: index as i64,
            is_ai_generated: true,
        };
        insert_question(conn, &question)?;
    }

    Ok(quiz)
}

fn insert_generated_flashcards(conn: &Connection, lesson_id: Uuid, cards: &[GeneratedFlashcard]) -> Result<Vec<Flashcard>> {
    let now = Utc::now();
    let mut saved = Vec::with_capacity(cards.len());

    for generated in cards {
        let card = Flashcard {
            id: Uuid::new_v4(),
            lesson_id,
            question: generated.question.clone(),
            answer: generated.answer.clone(),
            is_ai_generated: true,
            created_at: now,
        };
        conn.execute(
            "INSERT INTO flashcards (id, lesson_id, question, answer, is_ai_generated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                card.id.to_string(),
                card.lesson_id.to_string(),
                card.question,
                card.answer,
                card.is_ai_generated,
                ts(&card.created_at),
            ],
        )?;
        saved.push(card);
    }

    Ok(saved)
}

fn insert_generated_content(
    conn: &Connection,
    subject_id: Uuid,
    lesson_id: Uuid,
    kind: ContentKind,
    raw_json: String,
) -> Result<GeneratedContent> {
    let content = GeneratedContent {
        id: Uuid::new_v4(),
        subject_id,
        lesson_id,
        kind,
        content: raw_json,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO ai_generated_content (id, subject_id, lesson_id, type, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            content.id.to_string(),
            content.subject_id.to_string(),
            content.lesson_id.to_string(),
            content.kind.as_str(),
            content.content,
            ts(&content.created_at),
        ],
    )?;

    Ok(content)
}

fn insert_question(conn: &Connection, question: &QuizQuestion) -> Result<()> {
    conn.execute(
        "INSERT INTO quiz_questions (id, quiz_id, question, options, correct_answer, order_index, is_ai_generated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            question.id.to_string(),
            question.quiz_id.to_string(),
            question.question,
            serde_json::to_string(&question.options)?,
            question.correct_answer,
            question.order_index,
            question.is_ai_generated,
        ],
    )?;
    Ok(())
}
