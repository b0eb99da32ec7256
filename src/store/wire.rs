// src/store/wire.rs

//! Normalization at the remote boundary.
//!
//! Remote payloads have used both camelCase (`fileName`, `correctAnswer`,
//! `timeSpent`) and snake_case (`file_name`, `time_spent`) field names, and
//! both string and numeric ids. Everything is folded into the canonical
//! models here; nothing past this module looks at field-name variants.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{
    error::StoreError,
    models::{Answer, Question, QuestionKind, Quiz, QuizResult, Role, UserProfile},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

/// RFC 3339, a naive ISO timestamp taken as UTC, or epoch milliseconds.
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
            .map_err(|_| D::Error::custom(format!("unrecognized timestamp '{}'", s))),
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("timestamp {} out of range", ms))),
    }
}

fn published_by_default() -> bool {
    true
}

fn parse_kind(raw: &str) -> Result<QuestionKind, StoreError> {
    raw.parse().map_err(|e: crate::error::ValidationError| StoreError::InvalidPayload(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct WireQuestion {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correctAnswer", alias = "correct_answer", alias = "correctOptionIndex")]
    pub correct_option_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
}

impl WireQuestion {
    /// Questions without their own kind inherit the quiz's.
    fn into_question(self, quiz_kind: QuestionKind) -> Result<Question, StoreError> {
        let kind = match self.kind.as_deref() {
            Some(raw) => parse_kind(raw)?,
            None => quiz_kind,
        };
        if kind != quiz_kind {
            return Err(StoreError::InvalidPayload(format!(
                "question {} is {} inside a {} quiz",
                self.id, kind, quiz_kind
            )));
        }

        Ok(Question {
            id: self.id,
            text: self.text,
            options: self.options,
            correct_option_index: self.correct_option_index,
            explanation: self.explanation,
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireQuiz {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(alias = "fileName", alias = "file_name", alias = "sourceFileName")]
    pub source_file_name: String,
    #[serde(alias = "questionType", alias = "question_type", alias = "questionKind")]
    pub question_kind: String,
    #[serde(default)]
    pub questions: Vec<WireQuestion>,
    #[serde(deserialize_with = "id_string", alias = "createdBy", alias = "created_by", alias = "ownerId")]
    pub owner_id: String,
    #[serde(default = "published_by_default", alias = "isPublished")]
    pub is_published: bool,
    #[serde(deserialize_with = "timestamp", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl TryFrom<WireQuiz> for Quiz {
    type Error = StoreError;

    fn try_from(wire: WireQuiz) -> Result<Self, Self::Error> {
        let question_kind = parse_kind(&wire.question_kind)?;
        let questions = wire
            .questions
            .into_iter()
            .map(|q| q.into_question(question_kind))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz {
            id: wire.id,
            title: wire.title,
            source_file_name: wire.source_file_name,
            question_kind,
            questions,
            owner_id: wire.owner_id,
            is_published: wire.is_published,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireAnswer {
    #[serde(deserialize_with = "id_string", alias = "questionId")]
    pub question_id: String,
    #[serde(
        default,
        alias = "selectedOption",
        alias = "selected_option",
        alias = "selectedOptionIndex"
    )]
    pub selected_option_index: usize,
    #[serde(
        default,
        alias = "openEndedAnswer",
        alias = "open_ended_answer",
        alias = "openEndedText"
    )]
    pub open_ended_text: Option<String>,
    #[serde(alias = "isCorrect")]
    pub is_correct: bool,
    #[serde(default, alias = "timeSpent", alias = "time_spent", alias = "timeSpentMs")]
    pub time_spent_ms: u64,
}

impl From<WireAnswer> for Answer {
    fn from(wire: WireAnswer) -> Self {
        Answer {
            question_id: wire.question_id,
            selected_option_index: wire.selected_option_index,
            open_ended_text: wire.open_ended_text,
            is_correct: wire.is_correct,
            time_spent_ms: wire.time_spent_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireResult {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string", alias = "quizId")]
    pub quiz_id: String,
    #[serde(deserialize_with = "id_string", alias = "studentId")]
    pub student_id: String,
    #[serde(alias = "studentName")]
    pub student_name: String,
    #[serde(alias = "studentNumber")]
    pub student_number: String,
    #[serde(default)]
    pub answers: Vec<WireAnswer>,
    pub score: u32,
    #[serde(alias = "totalQuestions")]
    pub total_questions: u32,
    #[serde(deserialize_with = "timestamp", alias = "completedAt")]
    pub completed_at: DateTime<Utc>,
    #[serde(default, alias = "timeSpent", alias = "time_spent", alias = "timeSpentMs")]
    pub time_spent_ms: u64,
}

impl TryFrom<WireResult> for QuizResult {
    type Error = StoreError;

    fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
        if wire.score > wire.total_questions {
            return Err(StoreError::InvalidPayload(format!(
                "result {} scores {} out of {}",
                wire.id, wire.score, wire.total_questions
            )));
        }

        Ok(QuizResult {
            id: wire.id,
            quiz_id: wire.quiz_id,
            student_id: wire.student_id,
            student_name: wire.student_name,
            student_number: wire.student_number,
            answers: wire.answers.into_iter().map(Answer::from).collect(),
            score: wire.score,
            total_questions: wire.total_questions,
            completed_at: wire.completed_at,
            time_spent_ms: wire.time_spent_ms,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(alias = "type")]
    pub role: Role,
    #[serde(default, alias = "studentNumber")]
    pub student_number: Option<String>,
    #[serde(default, deserialize_with = "optional_timestamp", alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

fn optional_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "timestamp")] DateTime<Utc>);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(dt)| dt))
}

impl From<WireUser> for UserProfile {
    fn from(wire: WireUser) -> Self {
        UserProfile {
            id: wire.id,
            name: wire.name,
            email: wire.email,
            role: wire.role,
            student_number: wire.student_number,
            created_at: wire.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Login bodies: `{token, user}` or the older `{access_token, token_type}`.
#[derive(Debug, Deserialize)]
pub struct WireLogin {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub user: Option<WireUser>,
}

/// Normalizes a list, failing on the first malformed entry.
pub fn normalize_all<W, T>(items: Vec<W>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<W, Error = StoreError>,
{
    items.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn quiz_from(value: serde_json::Value) -> Result<Quiz, StoreError> {
        let wire: WireQuiz = serde_json::from_value(value).map_err(|e| StoreError::InvalidPayload(e.to_string()))?;
        Quiz::try_from(wire)
    }

    #[test]
    fn camel_and_snake_quizzes_normalize_identically() {
        let camel = quiz_from(json!({
            "id": 7,
            "title": "Cells",
            "fileName": "cells.pdf",
            "questionType": "multiple-choice",
            "questions": [{
                "id": "1",
                "question": "Powerhouse of the cell?",
                "options": ["Nucleus", "Mitochondria"],
                "correctAnswer": 1,
                "type": "multiple-choice"
            }],
            "createdBy": "t-1",
            "createdAt": "2025-03-01T10:00:00Z",
            "isPublished": true
        }))
        .unwrap();

        let snake = quiz_from(json!({
            "id": "7",
            "title": "Cells",
            "file_name": "cells.pdf",
            "question_type": "multiple-choice",
            "questions": [{
                "id": 1,
                "text": "Powerhouse of the cell?",
                "options": ["Nucleus", "Mitochondria"],
                "correct_option_index": 1
            }],
            "created_by": "t-1",
            "created_at": "2025-03-01T10:00:00"
        }))
        .unwrap();

        assert_eq!(camel, snake);
        assert_eq!(camel.id, "7");
        assert_eq!(camel.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(camel.questions[0].correct_option_index, 1);
    }

    #[test]
    fn rejects_question_of_another_kind() {
        let err = quiz_from(json!({
            "id": "q",
            "title": "Mixed",
            "file_name": "m.pdf",
            "question_type": "open-ended",
            "questions": [{ "id": "1", "text": "?", "type": "multiple-choice" }],
            "created_by": "t",
            "created_at": 1_700_000_000_000_i64
        }))
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn results_normalize_answer_field_variants() {
        let wire: WireResult = serde_json::from_value(json!({
            "id": 3,
            "quizId": 7,
            "studentId": "s-1",
            "studentName": "Ada",
            "studentNumber": "S-001",
            "answers": [{
                "questionId": "1",
                "selectedOption": 0,
                "isCorrect": true,
                "timeSpent": 1200,
                "openEndedAnswer": "Light to sugar"
            }],
            "score": 1,
            "totalQuestions": 1,
            "completedAt": "2025-03-01T10:05:00+02:00",
            "timeSpent": 5000
        }))
        .unwrap();

        let result = QuizResult::try_from(wire).unwrap();
        assert_eq!(result.quiz_id, "7");
        assert_eq!(result.answers[0].open_ended_text.as_deref(), Some("Light to sugar"));
        assert_eq!(result.answers[0].time_spent_ms, 1200);
        assert_eq!(result.time_spent_ms, 5000);
        assert_eq!(result.completed_at.to_rfc3339(), "2025-03-01T08:05:00+00:00");
    }

    #[test]
    fn rejects_score_above_total() {
        let wire: WireResult = serde_json::from_value(json!({
            "id": "r", "quiz_id": "q", "student_id": "s",
            "student_name": "n", "student_number": "1",
            "score": 4, "total_questions": 3,
            "completed_at": "2025-03-01T10:05:00Z"
        }))
        .unwrap();
        assert!(QuizResult::try_from(wire).is_err());
    }
}
