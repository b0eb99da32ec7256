// src/attempt.rs

//! One student's run through a quiz.
//!
//! ```text
//! NotStarted -> InProgress(0) -> AwaitingNext(0) -> InProgress(1) -> ... -> Completed
//! ```
//!
//! Every transition takes the current time explicitly. An attempt that is
//! dropped before `Completed` leaves nothing behind.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    error::ValidationError,
    models::{Answer, Question, QuestionKind, Quiz, ResultDraft},
    scoring::{self, Score},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    NotStarted,
    /// Question `index` is shown and has not been answered yet.
    InProgress { index: usize },
    /// Question `index` has been answered; waiting for the student to move on.
    AwaitingNext { index: usize },
    Completed,
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::NotStarted => f.write_str("not started"),
            AttemptState::InProgress { index } => write!(f, "in progress on question {}", index + 1),
            AttemptState::AwaitingNext { index } => {
                write!(f, "awaiting next after question {}", index + 1)
            }
            AttemptState::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot {action} while the attempt is {state}")]
    InvalidTransition {
        action: &'static str,
        state: AttemptState,
    },
}

/// The student a result is recorded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub id: String,
    pub name: String,
    pub student_number: String,
}

#[derive(Debug, Clone)]
pub struct Attempt {
    quiz: Quiz,
    state: AttemptState,
    answers: Vec<Answer>,
    started_at: Option<DateTime<Utc>>,
    question_started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            state: AttemptState::NotStarted,
            answers: Vec::new(),
            started_at: None,
            question_started_at: None,
            completed_at: None,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn is_completed(&self) -> bool {
        self.state == AttemptState::Completed
    }

    /// The question on screen, answered or not.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            AttemptState::InProgress { index } | AttemptState::AwaitingNext { index } => {
                self.quiz.questions.get(index)
            }
            AttemptState::NotStarted | AttemptState::Completed => None,
        }
    }

    /// The answer just given, while waiting for the student to move on.
    pub fn last_answer(&self) -> Option<&Answer> {
        match self.state {
            AttemptState::AwaitingNext { .. } => self.answers.last(),
            _ => None,
        }
    }

    /// One-based position of the current question and the total.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.quiz.questions.len();
        let position = match self.state {
            AttemptState::NotStarted => 0,
            AttemptState::InProgress { index } | AttemptState::AwaitingNext { index } => index + 1,
            AttemptState::Completed => total,
        };
        (position, total)
    }

    /// Time spent on the current question so far. Zero unless a question is
    /// waiting for an answer.
    pub fn question_elapsed(&self, now: DateTime<Utc>) -> Duration {
        match (self.state, self.question_started_at) {
            (AttemptState::InProgress { .. }, Some(started)) => Duration::from_millis(millis_between(started, now)),
            _ => Duration::ZERO,
        }
    }

    /// `NotStarted -> InProgress(0)`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        if self.state != AttemptState::NotStarted {
            return Err(self.invalid("start"));
        }

        self.started_at = Some(now);
        if self.quiz.questions.is_empty() {
            self.complete(now);
        } else {
            self.enter_question(0, now);
        }
        tracing::debug!("Attempt on quiz {} started", self.quiz.id);
        Ok(())
    }

    /// Answers the current multiple-choice question.
    pub fn select_option(&mut self, option_index: usize, now: DateTime<Utc>) -> Result<&Answer, AttemptError> {
        let index = self.answering_index("select an option")?;
        let question = &self.quiz.questions[index];

        match question.kind {
            QuestionKind::MultipleChoice => {}
            QuestionKind::OpenEnded => {
                return Err(ValidationError::Invalid(
                    "open-ended questions are answered with text".to_string(),
                )
                .into());
            }
        }
        if option_index >= question.options.len() {
            return Err(ValidationError::OptionOutOfRange {
                index: option_index,
                count: question.options.len(),
            }
            .into());
        }

        let answer = Answer {
            question_id: question.id.clone(),
            selected_option_index: option_index,
            open_ended_text: None,
            is_correct: scoring::is_correct(question, option_index),
            time_spent_ms: self.time_on_question(now),
        };
        Ok(self.record(index, answer))
    }

    /// Answers the current open-ended question. Blank text is rejected and
    /// leaves the attempt where it was.
    pub fn submit_text(&mut self, text: &str, now: DateTime<Utc>) -> Result<&Answer, AttemptError> {
        let index = self.answering_index("submit text")?;
        let question = &self.quiz.questions[index];

        match question.kind {
            QuestionKind::OpenEnded => {}
            QuestionKind::MultipleChoice => {
                return Err(ValidationError::Invalid(
                    "multiple-choice questions are answered by selecting an option".to_string(),
                )
                .into());
            }
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField("answer").into());
        }

        let answer = Answer {
            question_id: question.id.clone(),
            selected_option_index: 0,
            open_ended_text: Some(text.to_string()),
            is_correct: scoring::is_correct(question, 0),
            time_spent_ms: self.time_on_question(now),
        };
        Ok(self.record(index, answer))
    }

    /// `AwaitingNext(i) -> InProgress(i + 1)`, or `Completed` after the last
    /// question.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AttemptState, AttemptError> {
        let AttemptState::AwaitingNext { index } = self.state else {
            return Err(self.invalid("advance"));
        };

        let next = index + 1;
        if next < self.quiz.questions.len() {
            self.enter_question(next, now);
        } else {
            self.complete(now);
            tracing::debug!("Attempt on quiz {} completed", self.quiz.id);
        }
        Ok(self.state)
    }

    pub fn score(&self) -> Score {
        scoring::score(&self.quiz, &self.answers)
    }

    /// Builds the result to submit. Only a completed attempt has one.
    ///
    /// Borrows the attempt so that a failed submission can be retried from
    /// the same draft.
    pub fn finish(&self, student: &StudentIdentity) -> Result<ResultDraft, AttemptError> {
        let (AttemptState::Completed, Some(started_at), Some(completed_at)) =
            (self.state, self.started_at, self.completed_at)
        else {
            return Err(self.invalid("finish"));
        };
        if student.student_number.trim().is_empty() {
            return Err(ValidationError::EmptyField("student number").into());
        }

        let score = self.score();
        Ok(ResultDraft {
            quiz_id: self.quiz.id.clone(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            student_number: student.student_number.clone(),
            answers: self.answers.clone(),
            score: score.correct_count,
            total_questions: score.total_questions,
            completed_at,
            time_spent_ms: millis_between(started_at, completed_at),
        })
    }

    /// Walks away from the attempt. Collected answers are discarded.
    pub fn abandon(self) {
        if !self.is_completed() {
            tracing::debug!(
                "Attempt on quiz {} abandoned with {} answer(s)",
                self.quiz.id,
                self.answers.len()
            );
        }
    }

    fn answering_index(&self, action: &'static str) -> Result<usize, AttemptError> {
        match self.state {
            AttemptState::InProgress { index } => Ok(index),
            _ => Err(self.invalid(action)),
        }
    }

    fn record(&mut self, index: usize, answer: Answer) -> &Answer {
        self.answers.push(answer);
        self.state = AttemptState::AwaitingNext { index };
        self.question_started_at = None;
        &self.answers[self.answers.len() - 1]
    }

    fn enter_question(&mut self, index: usize, now: DateTime<Utc>) {
        self.state = AttemptState::InProgress { index };
        self.question_started_at = Some(now);
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.state = AttemptState::Completed;
        self.question_started_at = None;
        self.completed_at = Some(now);
    }

    fn time_on_question(&self, now: DateTime<Utc>) -> u64 {
        self.question_started_at
            .map(|started| millis_between(started, now))
            .unwrap_or(0)
    }

    fn invalid(&self, action: &'static str) -> AttemptError {
        AttemptError::InvalidTransition {
            action,
            state: self.state,
        }
    }
}

fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn quiz(kind: QuestionKind, n: usize) -> Quiz {
        let questions = (0..n)
            .map(|i| Question {
                id: format!("q{}", i + 1),
                text: format!("Question {}", i + 1),
                options: match kind {
                    QuestionKind::MultipleChoice => vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    QuestionKind::OpenEnded => vec![],
                },
                correct_option_index: 2,
                explanation: Some("because".into()),
                kind,
            })
            .collect();

        Quiz {
            id: "quiz-1".into(),
            title: "Cells".into(),
            source_file_name: "cells.pdf".into(),
            question_kind: kind,
            questions,
            owner_id: "teacher-1".into(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn student() -> StudentIdentity {
        StudentIdentity {
            id: "student-1".into(),
            name: "Ada".into(),
            student_number: "S-001".into(),
        }
    }

    fn at(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        base + TimeDelta::seconds(secs)
    }

    #[test]
    fn walks_through_a_multiple_choice_quiz() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::MultipleChoice, 5));
        attempt.start(t0).unwrap();
        assert_eq!(attempt.state(), AttemptState::InProgress { index: 0 });

        // Right on 1, 3, 5; wrong on 2, 4.
        for (i, selected) in [2, 0, 2, 1, 2].into_iter().enumerate() {
            let answer = attempt.select_option(selected, at(t0, i as i64 * 10 + 4)).unwrap();
            assert_eq!(answer.time_spent_ms, 4_000);
            assert_eq!(attempt.state(), AttemptState::AwaitingNext { index: i });
            attempt.advance(at(t0, i as i64 * 10 + 10)).unwrap();
        }

        assert!(attempt.is_completed());
        let draft = attempt.finish(&student()).unwrap();
        assert_eq!(draft.score(), 3);
        assert_eq!(draft.total_questions(), 5);
        assert_eq!(draft.percentage(), 60);
        assert_eq!(draft.answers().len(), 5);
        assert_eq!(draft.time_spent_ms(), 50_000);
    }

    #[test]
    fn blank_open_ended_answer_keeps_question_open() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::OpenEnded, 3));
        attempt.start(t0).unwrap();

        let err = attempt.submit_text("   \n", at(t0, 3)).unwrap_err();
        assert_eq!(err, AttemptError::Validation(ValidationError::EmptyField("answer")));
        assert_eq!(attempt.state(), AttemptState::InProgress { index: 0 });
        assert!(attempt.answers().is_empty());

        let answer = attempt.submit_text("  Light becomes sugar. ", at(t0, 5)).unwrap();
        assert_eq!(answer.open_ended_text.as_deref(), Some("Light becomes sugar."));
        assert_eq!(answer.selected_option_index, 0);
        assert!(answer.is_correct);
    }

    #[test]
    fn open_ended_quiz_scores_full_marks() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::OpenEnded, 3));
        attempt.start(t0).unwrap();
        for i in 0..3 {
            attempt.submit_text("x", at(t0, i)).unwrap();
            attempt.advance(at(t0, i)).unwrap();
        }

        let draft = attempt.finish(&student()).unwrap();
        assert_eq!((draft.score(), draft.total_questions(), draft.percentage()), (3, 3, 100));
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::MultipleChoice, 2));

        assert!(matches!(
            attempt.select_option(0, t0),
            Err(AttemptError::InvalidTransition { action: "select an option", .. })
        ));
        attempt.start(t0).unwrap();
        assert!(attempt.start(t0).is_err());
        assert!(attempt.advance(t0).is_err());
        assert!(attempt.finish(&student()).is_err());

        attempt.select_option(1, t0).unwrap();
        assert!(attempt.select_option(2, t0).is_err());
        assert_eq!(attempt.answers().len(), 1);
    }

    #[test]
    fn rejects_wrong_answer_shapes() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::MultipleChoice, 1));
        attempt.start(t0).unwrap();

        assert!(matches!(
            attempt.select_option(4, t0),
            Err(AttemptError::Validation(ValidationError::OptionOutOfRange { index: 4, count: 4 }))
        ));
        assert!(matches!(
            attempt.submit_text("c", t0),
            Err(AttemptError::Validation(ValidationError::Invalid(_)))
        ));
        assert_eq!(attempt.state(), AttemptState::InProgress { index: 0 });
    }

    #[test]
    fn question_timer_resets_per_question() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::MultipleChoice, 2));
        attempt.start(t0).unwrap();
        assert_eq!(attempt.question_elapsed(at(t0, 7)), Duration::from_secs(7));

        attempt.select_option(0, at(t0, 8)).unwrap();
        assert_eq!(attempt.question_elapsed(at(t0, 20)), Duration::ZERO);

        attempt.advance(at(t0, 30)).unwrap();
        assert_eq!(attempt.question_elapsed(at(t0, 33)), Duration::from_secs(3));
        assert_eq!(attempt.select_option(2, at(t0, 35)).unwrap().time_spent_ms, 5_000);
        assert_eq!(attempt.progress(), (2, 2));
    }

    #[test]
    fn finish_requires_student_number() {
        let t0 = Utc::now();
        let mut attempt = Attempt::new(quiz(QuestionKind::MultipleChoice, 1));
        attempt.start(t0).unwrap();
        attempt.select_option(0, t0).unwrap();
        attempt.advance(t0).unwrap();

        let mut anonymous = student();
        anonymous.student_number = String::new();
        assert!(matches!(
            attempt.finish(&anonymous),
            Err(AttemptError::Validation(ValidationError::EmptyField("student number")))
        ));
    }
}
