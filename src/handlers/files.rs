// src/handlers/files.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::quizzes::insert_quiz,
    models::{NewQuiz, QuestionKind, quiz::title_from_file_name},
    services::{QuestionGenerator, SourceDocument},
    utils::jwt::Claims,
};

/// The `file` and `question_type` fields of an upload form.
struct Upload {
    document: SourceDocument,
    kind: QuestionKind,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut document = None;
    let mut kind = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                document = Some(SourceDocument::new(file_name, bytes.to_vec()));
            }
            "question_type" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                kind = Some(raw.trim().parse::<QuestionKind>()?);
            }
            _ => {}
        }
    }

    Ok(Upload {
        document: document.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?,
        kind: kind.ok_or_else(|| AppError::BadRequest("Missing 'question_type' field".to_string()))?,
    })
}

/// Generates questions from an uploaded PDF without storing anything.
pub async fn generate(
    State(generator): State<Arc<dyn QuestionGenerator>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = read_upload(multipart).await?;
    let questions = generator.generate(&upload.document, upload.kind).await?;

    Ok(Json(json!({ "questions": questions })))
}

/// Generates questions from an uploaded PDF and publishes them as a quiz.
pub async fn upload(
    State(pool): State<PgPool>,
    State(generator): State<Arc<dyn QuestionGenerator>>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let Upload { document, kind } = read_upload(multipart).await?;
    let questions = generator.generate(&document, kind).await?;

    let quiz = NewQuiz::published(
        claims.sub,
        title_from_file_name(&document.file_name),
        document.file_name.clone(),
        kind,
        questions,
    );
    let created = insert_quiz(&pool, quiz).await?;

    Ok((StatusCode::CREATED, Json(created)))
}
