// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::quizzes::fetch_quiz,
    models::{
        Answer, Question, QuestionKind, Quiz, QuizResult,
        quiz_result::{CreateResultRequest, QuizResultRow},
    },
    scoring,
    utils::{
        html::{clean_answer, clean_html},
        jwt::Claims,
    },
};

/// Answers must follow the quiz's questions one-to-one and in order.
fn check_answers(quiz: &Quiz, answers: &[Answer]) -> Result<(), AppError> {
    if answers.len() != quiz.question_count() {
        return Err(AppError::BadRequest(format!(
            "Expected {} answers, got {}",
            quiz.question_count(),
            answers.len()
        )));
    }

    for (position, (question, answer)) in quiz.questions.iter().zip(answers).enumerate() {
        if question.id != answer.question_id {
            return Err(AppError::BadRequest(format!(
                "Answer {} is for question '{}', expected '{}'",
                position + 1,
                answer.question_id,
                question.id
            )));
        }
        check_grading(question, answer).map_err(|reason| {
            AppError::BadRequest(format!("Answer {} {}", position + 1, reason))
        })?;
    }
    Ok(())
}

/// The correctness flag must be the one the scoring engine would set.
fn check_grading(question: &Question, answer: &Answer) -> Result<(), &'static str> {
    match question.kind {
        QuestionKind::MultipleChoice => {
            if answer.selected_option_index >= question.options.len() {
                return Err("selects an option that does not exist");
            }
            if answer.open_ended_text.is_some() {
                return Err("carries text for a multiple-choice question");
            }
        }
        QuestionKind::OpenEnded => {
            if answer.open_ended_text.as_deref().is_none_or(|t| t.trim().is_empty()) {
                return Err("is empty");
            }
        }
    }

    if answer.is_correct != scoring::is_correct(question, answer.selected_option_index) {
        return Err("is graded incorrectly");
    }
    Ok(())
}

/// Records a completed attempt for the calling student.
///
/// The score is recomputed from the answers; a disagreeing score is rejected.
pub async fn create_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(mut payload): Json<CreateResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = fetch_quiz(&pool, &payload.quiz_id).await?;
    if !quiz.is_published {
        return Err(AppError::NotFound(format!("Quiz {} not found", quiz.id)));
    }
    check_answers(&quiz, &payload.answers)?;

    let expected = scoring::score(&quiz, &payload.answers);
    if payload.total_questions != expected.total_questions || payload.score != expected.correct_count {
        return Err(AppError::BadRequest(format!(
            "Score {}/{} does not match the answers ({}/{})",
            payload.score, payload.total_questions, expected.correct_count, expected.total_questions
        )));
    }

    payload.answers.iter_mut().for_each(clean_answer);

    let row = sqlx::query_as::<_, QuizResultRow>(
        r#"
        INSERT INTO quiz_results
            (id, quiz_id, student_id, student_name, student_number, answers, score, total_questions, completed_at, time_spent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, quiz_id, student_id, student_name, student_number, answers, score, total_questions, completed_at, time_spent
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&quiz.id)
    .bind(&claims.sub)
    .bind(clean_html(payload.student_name.trim()))
    .bind(clean_html(payload.student_number.trim()))
    .bind(SqlJson(&payload.answers))
    .bind(expected.correct_count as i32)
    .bind(expected.total_questions as i32)
    .bind(Utc::now())
    .bind(payload.time_spent_ms as i64)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save result: {:?}", e);
        AppError::from(e)
    })?;

    let result = QuizResult::from(row);
    tracing::info!(
        "Result {} recorded for quiz {}: {}/{}",
        result.id,
        result.quiz_id,
        result.score,
        result.total_questions
    );

    Ok((StatusCode::CREATED, Json(result)))
}

/// The calling user's own results, newest first.
pub async fn my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, QuizResultRow>(
        r#"
        SELECT id, quiz_id, student_id, student_name, student_number, answers, score, total_questions, completed_at, time_spent
        FROM quiz_results
        WHERE student_id = $1
        ORDER BY completed_at DESC
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&pool)
    .await?;

    Ok(Json(rows.into_iter().map(QuizResult::from).collect::<Vec<_>>()))
}

/// Every recorded result. Teachers only.
pub async fn all_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, QuizResultRow>(
        r#"
        SELECT id, quiz_id, student_id, student_name, student_number, answers, score, total_questions, completed_at, time_spent
        FROM quiz_results
        ORDER BY completed_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows.into_iter().map(QuizResult::from).collect::<Vec<_>>()))
}

/// Results for one quiz, visible only to the teacher who owns it.
pub async fn quiz_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, &quiz_id).await?;
    if quiz.owner_id != claims.sub {
        return Err(AppError::Forbidden("Not your quiz".to_string()));
    }

    let rows = sqlx::query_as::<_, QuizResultRow>(
        r#"
        SELECT id, quiz_id, student_id, student_name, student_number, answers, score, total_questions, completed_at, time_spent
        FROM quiz_results
        WHERE quiz_id = $1
        ORDER BY completed_at DESC
        "#,
    )
    .bind(&quiz.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(rows.into_iter().map(QuizResult::from).collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(kind: QuestionKind) -> Quiz {
        let questions = ["q1", "q2"]
            .iter()
            .map(|id| Question {
                id: id.to_string(),
                text: "?".into(),
                options: if kind == QuestionKind::MultipleChoice {
                    vec!["a".into(), "b".into()]
                } else {
                    Vec::new()
                },
                correct_option_index: 0,
                explanation: None,
                kind,
            })
            .collect();
        Quiz {
            id: "quiz".into(),
            title: "t".into(),
            source_file_name: "t.pdf".into(),
            question_kind: kind,
            questions,
            owner_id: "teacher".into(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn answer(question_id: &str, text: Option<&str>) -> Answer {
        Answer {
            question_id: question_id.into(),
            selected_option_index: 0,
            open_ended_text: text.map(str::to_string),
            is_correct: true,
            time_spent_ms: 100,
        }
    }

    #[test]
    fn answers_must_match_questions_in_order() {
        let quiz = quiz(QuestionKind::MultipleChoice);

        assert!(check_answers(&quiz, &[answer("q1", None), answer("q2", None)]).is_ok());
        assert!(check_answers(&quiz, &[answer("q1", None)]).is_err());
        assert!(check_answers(&quiz, &[answer("q2", None), answer("q1", None)]).is_err());
    }

    #[test]
    fn multiple_choice_flags_must_match_the_key() {
        let quiz = quiz(QuestionKind::MultipleChoice);

        // Option 1 is wrong, option 99 does not exist; both claim to be correct.
        let mut wrong = answer("q1", None);
        wrong.selected_option_index = 1;
        let mut missing = answer("q2", None);
        missing.selected_option_index = 99;
        assert!(check_answers(&quiz, &[wrong.clone(), answer("q2", None)]).is_err());
        assert!(check_answers(&quiz, &[answer("q1", None), missing]).is_err());

        // Honest flags on the same wrong choice are accepted and score 1 of 2.
        wrong.is_correct = false;
        let answers = [wrong, answer("q2", None)];
        assert!(check_answers(&quiz, &answers).is_ok());
        assert_eq!(scoring::score(&quiz, &answers).correct_count, 1);

        let with_text = [answer("q1", Some("mitochondria")), answer("q2", None)];
        assert!(check_answers(&quiz, &with_text).is_err());
    }

    #[test]
    fn open_ended_answers_are_always_marked_correct() {
        let quiz = quiz(QuestionKind::OpenEnded);

        let mut unmarked = answer("q2", Some("y"));
        unmarked.is_correct = false;
        assert!(check_answers(&quiz, &[answer("q1", Some("x")), unmarked]).is_err());
    }

    #[test]
    fn open_ended_answers_need_text() {
        let quiz = quiz(QuestionKind::OpenEnded);

        assert!(check_answers(&quiz, &[answer("q1", Some("x")), answer("q2", Some("y"))]).is_ok());
        assert!(check_answers(&quiz, &[answer("q1", Some("x")), answer("q2", Some("  "))]).is_err());
        assert!(check_answers(&quiz, &[answer("q1", Some("x")), answer("q2", None)]).is_err());
    }
}
