// src/handlers/quizzes.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        NewQuiz, Quiz, Role,
        quiz::{CreateQuizRequest, QuizRow},
    },
    utils::{
        html::{clean_html, clean_question},
        jwt::Claims,
    },
};

fn into_quizzes(rows: Vec<QuizRow>) -> Result<Vec<Quiz>, AppError> {
    rows.into_iter()
        .map(|row| Quiz::try_from(row).map_err(|e| AppError::InternalServerError(e.to_string())))
        .collect()
}

/// Sanitizes, validates and stores a new quiz.
pub(crate) async fn insert_quiz(pool: &PgPool, mut quiz: NewQuiz) -> Result<Quiz, AppError> {
    quiz.title = clean_html(quiz.title.trim());
    quiz.source_file_name = clean_html(quiz.source_file_name.trim());
    quiz.questions.iter_mut().for_each(clean_question);
    quiz.validate()?;

    let row = sqlx::query_as::<_, QuizRow>(
        r#"
        INSERT INTO quizzes (id, title, file_name, question_type, questions, created_by, is_published)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, file_name, question_type, questions, created_by, is_published, created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&quiz.title)
    .bind(&quiz.source_file_name)
    .bind(quiz.question_kind.as_str())
    .bind(SqlJson(&quiz.questions))
    .bind(&quiz.owner_id)
    .bind(quiz.is_published)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    let created = Quiz::try_from(row).map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tracing::info!(
        "Quiz {} created by {} with {} questions",
        created.id,
        created.owner_id,
        created.question_count()
    );
    Ok(created)
}

pub(crate) async fn fetch_quiz(pool: &PgPool, id: &str) -> Result<Quiz, AppError> {
    let row = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT id, title, file_name, question_type, questions, created_by, is_published, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    Quiz::try_from(row).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Creates a published quiz owned by the calling teacher.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = NewQuiz::published(
        claims.sub,
        payload.title,
        payload.source_file_name,
        payload.question_kind,
        payload.questions,
    );
    let created = insert_quiz(&pool, quiz).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists every published quiz, newest first.
pub async fn list_published(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT id, title, file_name, question_type, questions, created_by, is_published, created_at
        FROM quizzes
        WHERE is_published = TRUE
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(into_quizzes(rows)?))
}

/// Lists the calling teacher's quizzes, newest first.
pub async fn list_mine(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT id, title, file_name, question_type, questions, created_by, is_published, created_at
        FROM quizzes
        WHERE created_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&pool)
    .await?;

    Ok(Json(into_quizzes(rows)?))
}

/// Fetches one quiz. Unpublished quizzes are visible to their owner only.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, &id).await?;

    let is_owner = claims.role == Role::Teacher && quiz.owner_id == claims.sub;
    if !quiz.is_published && !is_owner {
        return Err(AppError::NotFound(format!("Quiz {} not found", id)));
    }

    Ok(Json(quiz))
}
