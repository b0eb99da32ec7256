// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The two kinds of question a quiz can hold.
///
/// Serialized as `"multiple-choice"` / `"open-ended"`, which is also how the
/// kind is stored in the `quizzes.question_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    OpenEnded,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::OpenEnded => "open-ended",
        }
    }

    /// Whether answers of this kind are graded automatically.
    pub fn is_auto_graded(&self) -> bool {
        match self {
            QuestionKind::MultipleChoice => true,
            QuestionKind::OpenEnded => false,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" | "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "open-ended" | "open_ended" => Ok(QuestionKind::OpenEnded),
            other => Err(ValidationError::UnknownQuestionKind(other.to_string())),
        }
    }
}

/// A single question inside a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable per quiz.
    pub id: String,

    /// The prompt shown to the student.
    pub text: String,

    /// Ordered answer options. Empty for open-ended questions.
    #[serde(default)]
    pub options: Vec<String>,

    /// Index into `options`. Ignored for open-ended questions.
    #[serde(default)]
    pub correct_option_index: usize,

    /// Shown after the question is answered.
    #[serde(default)]
    pub explanation: Option<String>,

    pub kind: QuestionKind,
}

impl Question {
    /// Checks the per-question invariants for the question's own kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("question id"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyField("question text"));
        }
        match self.kind {
            QuestionKind::MultipleChoice => {
                if self.options.len() < 2 {
                    return Err(ValidationError::TooFewOptions {
                        question_id: self.id.clone(),
                        count: self.options.len(),
                    });
                }
                if self.options.iter().any(|o| o.trim().is_empty()) {
                    return Err(ValidationError::EmptyField("option"));
                }
                if self.correct_option_index >= self.options.len() {
                    return Err(ValidationError::OptionOutOfRange {
                        index: self.correct_option_index,
                        count: self.options.len(),
                    });
                }
            }
            QuestionKind::OpenEnded => {}
        }
        Ok(())
    }
}

/// Validates a question list against the kind declared by its quiz.
///
/// The list must be non-empty, every question must satisfy its own
/// invariants, question ids must be unique and every question must share
/// `kind`.
pub fn validate_questions(kind: QuestionKind, questions: &[Question]) -> Result<(), ValidationError> {
    if questions.is_empty() {
        return Err(ValidationError::EmptyField("questions"));
    }

    let mut seen = std::collections::HashSet::new();
    for question in questions {
        if question.kind != kind {
            return Err(ValidationError::MixedQuestionKinds {
                question_id: question.id.clone(),
                expected: kind,
                found: question.kind,
            });
        }
        question.validate()?;
        if !seen.insert(question.id.as_str()) {
            return Err(ValidationError::DuplicateQuestionId(question.id.clone()));
        }
    }
    Ok(())
}
