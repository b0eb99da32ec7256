// src/scoring.rs

//! Pure scoring functions.
//!
//! Multiple-choice correctness is decided once, when the answer is submitted
//! (see [`is_correct`]). Scoring afterwards only counts the stored flags.

use crate::models::{Answer, Question, QuestionKind, Quiz, QuizResult};

/// Correct answers out of the quiz's question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct_count: u32,
    pub total_questions: u32,
}

impl Score {
    pub fn percentage(&self) -> u32 {
        percentage(self.correct_count, self.total_questions)
    }
}

/// Whether selecting `selected_option_index` answers `question` correctly.
///
/// Open-ended answers are never auto-graded; submitting one counts.
pub fn is_correct(question: &Question, selected_option_index: usize) -> bool {
    match question.kind {
        QuestionKind::MultipleChoice => selected_option_index == question.correct_option_index,
        QuestionKind::OpenEnded => true,
    }
}

/// Scores a set of answers against a quiz.
pub fn score(quiz: &Quiz, answers: &[Answer]) -> Score {
    score_flags(quiz.question_kind, quiz.questions.len(), answers)
}

/// Scores answers given only the quiz kind and its question count.
pub fn score_flags(kind: QuestionKind, total_questions: usize, answers: &[Answer]) -> Score {
    let total_questions = total_questions as u32;
    let correct_count = match kind {
        QuestionKind::MultipleChoice => {
            let flagged = answers.iter().filter(|a| a.is_correct).count() as u32;
            flagged.min(total_questions)
        }
        QuestionKind::OpenEnded => total_questions,
    };

    Score {
        correct_count,
        total_questions,
    }
}

/// `round(correct / total * 100)`, or 0 for an empty quiz.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    raw_percentage(correct, total).round() as u32
}

fn raw_percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// Mean of the per-result percentages, rounded once at the end.
///
/// Not a weighted mean of raw counts.
pub fn average_percentage<'a, I>(results: I) -> u32
where
    I: IntoIterator<Item = &'a QuizResult>,
{
    let (sum, count) = results
        .into_iter()
        .fold((0.0_f64, 0_u32), |(sum, count), r| {
            (sum + raw_percentage(r.score, r.total_questions), count + 1)
        });

    if count == 0 {
        return 0;
    }
    (sum / count as f64).round() as u32
}

/// Per-quiz figures for a teacher's overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizStats {
    pub result_count: usize,
    pub average_percentage: u32,
}

/// Result count and average score for one quiz, ignoring other quizzes' results.
pub fn quiz_stats<'a, I>(quiz_id: &str, results: I) -> QuizStats
where
    I: IntoIterator<Item = &'a QuizResult>,
{
    let matching: Vec<&QuizResult> = results.into_iter().filter(|r| r.quiz_id == quiz_id).collect();
    QuizStats {
        result_count: matching.len(),
        average_percentage: average_percentage(matching),
    }
}

/// Figures shown on a result review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    pub percentage: u32,
    /// Sum of the per-question answer times.
    pub answer_time_ms: u64,
    /// Whole seconds, rounded.
    pub average_seconds_per_question: u64,
}

pub fn summarize(result: &QuizResult) -> ResultSummary {
    let answer_time_ms: u64 = result.answers.iter().map(|a| a.time_spent_ms).sum();
    let average_seconds_per_question = if result.answers.is_empty() {
        0
    } else {
        (answer_time_ms as f64 / result.answers.len() as f64 / 1000.0).round() as u64
    };

    ResultSummary {
        percentage: result.percentage(),
        answer_time_ms,
        average_seconds_per_question,
    }
}

/// Formats a duration as `"2m 5s"`, or `"42s"` under a minute.
///
/// Partial seconds are dropped, not rounded.
pub fn format_duration_ms(milliseconds: u64) -> String {
    let seconds = milliseconds / 1000;
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
