// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    error::ValidationError,
    models::question::{Question, QuestionKind, validate_questions},
};

/// A published, immutable set of questions of one kind, owned by a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub source_file_name: String,

    /// Fixed at creation. Every question inside shares this kind.
    pub question_kind: QuestionKind,

    /// Presentation order; answers index into this list.
    pub questions: Vec<Question>,

    /// The creating teacher.
    pub owner_id: String,

    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// A quiz that has not been recorded yet.
///
/// The backend assigns the id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuiz {
    pub owner_id: String,
    pub title: String,
    pub source_file_name: String,
    pub question_kind: QuestionKind,
    pub questions: Vec<Question>,
    pub is_published: bool,
}

impl NewQuiz {
    /// Builds a quiz that is published on creation.
    pub fn published(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        source_file_name: impl Into<String>,
        question_kind: QuestionKind,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            source_file_name: source_file_name.into(),
            question_kind,
            questions,
            is_published: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("owner id"));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.source_file_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("source file name"));
        }
        validate_questions(self.question_kind, &self.questions)
    }

    /// Turns the pending quiz into a recorded one.
    pub fn into_quiz(self, id: String, created_at: DateTime<Utc>) -> Quiz {
        Quiz {
            id,
            title: self.title,
            source_file_name: self.source_file_name,
            question_kind: self.question_kind,
            questions: self.questions,
            owner_id: self.owner_id,
            is_published: self.is_published,
            created_at,
        }
    }
}

/// Derives a quiz title from an uploaded file name (`notes.pdf` -> `notes`).
pub fn title_from_file_name(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let lower = trimmed.to_ascii_lowercase();
    match lower.strip_suffix(".pdf") {
        Some(stem) if !stem.is_empty() => trimmed[..stem.len()].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: String,
    pub title: String,
    pub file_name: String,

    /// 'multiple-choice' or 'open-ended'.
    pub question_type: String,

    /// Stored as a JSONB array.
    pub questions: Json<Vec<Question>>,

    pub created_by: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = ValidationError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        Ok(Quiz {
            id: row.id,
            title: row.title,
            source_file_name: row.file_name,
            question_kind: row.question_type.parse()?,
            questions: row.questions.0,
            owner_id: row.created_by,
            is_published: row.is_published,
            created_at: row.created_at,
        })
    }
}

/// DTO for creating a quiz through the API.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub source_file_name: String,
    pub question_kind: QuestionKind,
    #[validate(length(min = 1, max = 100))]
    pub questions: Vec<Question>,
}
