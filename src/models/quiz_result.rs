// src/models/quiz_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// One student's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,

    /// Placeholder `0` for open-ended questions.
    pub selected_option_index: usize,

    /// Only populated for open-ended questions.
    #[serde(default)]
    pub open_ended_text: Option<String>,

    /// Set when the answer is submitted. Open-ended answers are always
    /// "correct", meaning submitted.
    pub is_correct: bool,

    pub time_spent_ms: u64,
}

/// The durable record of a completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_number: String,

    /// Same length and order as the quiz's questions.
    pub answers: Vec<Answer>,

    pub score: u32,

    /// Snapshot of the quiz's question count at scoring time.
    pub total_questions: u32,

    pub completed_at: DateTime<Utc>,

    /// Wall clock from the start of the attempt to its completion.
    pub time_spent_ms: u64,
}

impl QuizResult {
    pub fn percentage(&self) -> u32 {
        crate::scoring::percentage(self.score, self.total_questions)
    }
}

/// A scored result that has not been recorded yet.
///
/// Only a completed attempt can produce one (see
/// [`Attempt::finish`](crate::attempt::Attempt::finish)), so a partially
/// answered quiz can never be submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDraft {
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_number: String,
    pub(crate) answers: Vec<Answer>,
    pub(crate) score: u32,
    pub(crate) total_questions: u32,
    pub(crate) completed_at: DateTime<Utc>,
    pub(crate) time_spent_ms: u64,
}

impl ResultDraft {
    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn time_spent_ms(&self) -> u64 {
        self.time_spent_ms
    }

    pub fn percentage(&self) -> u32 {
        crate::scoring::percentage(self.score, self.total_questions)
    }

    /// Records the draft under the given id.
    pub fn into_result(self, id: String) -> QuizResult {
        QuizResult {
            id,
            quiz_id: self.quiz_id,
            student_id: self.student_id,
            student_name: self.student_name,
            student_number: self.student_number,
            answers: self.answers,
            score: self.score,
            total_questions: self.total_questions,
            completed_at: self.completed_at,
            time_spent_ms: self.time_spent_ms,
        }
    }
}

/// Represents the 'quiz_results' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuizResultRow {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_number: String,
    pub answers: Json<Vec<Answer>>,
    pub score: i32,
    pub total_questions: i32,
    pub completed_at: DateTime<Utc>,

    /// Milliseconds.
    pub time_spent: i64,
}

impl From<QuizResultRow> for QuizResult {
    fn from(row: QuizResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            student_id: row.student_id,
            student_name: row.student_name,
            student_number: row.student_number,
            answers: row.answers.0,
            score: row.score.max(0) as u32,
            total_questions: row.total_questions.max(0) as u32,
            completed_at: row.completed_at,
            time_spent_ms: row.time_spent.max(0) as u64,
        }
    }
}

/// DTO for submitting a completed attempt.
///
/// The student is taken from the bearer token, not from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResultRequest {
    #[validate(length(min = 1))]
    pub quiz_id: String,
    #[validate(length(min = 1, max = 100))]
    pub student_name: String,
    #[validate(length(min = 1, max = 50))]
    pub student_number: String,
    #[validate(length(min = 1))]
    pub answers: Vec<Answer>,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent_ms: u64,
}
