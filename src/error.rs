// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{attempt::AttemptError, models::QuestionKind};

/// A required value is missing or malformed.
///
/// Raised locally; the triggering transition is blocked and nothing changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("option {index} is out of range for a question with {count} options")]
    OptionOutOfRange { index: usize, count: usize },

    #[error("question {question_id} needs at least two options, found {count}")]
    TooFewOptions { question_id: String, count: usize },

    #[error("question {question_id} is {found} but the quiz is {expected}")]
    MixedQuestionKinds {
        question_id: String,
        expected: QuestionKind,
        found: QuestionKind,
    },

    #[error("question id {0} is used more than once")]
    DuplicateQuestionId(String),

    #[error("unknown question kind '{0}'")]
    UnknownQuestionKind(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("{0}")]
    Invalid(String),
}

/// Authentication failed or the session is no longer valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session expired or token rejected")]
    SessionExpired,

    #[error("this action requires the {0} role")]
    WrongRole(crate::models::Role),

    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

/// The question generation collaborator could not produce questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("failed to generate questions: {0}")]
    Processing(String),
}

/// A call to the persistence authority failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Network failure, timeout or server error. Safe for the user to retry.
    #[error("temporarily unavailable: {0}")]
    Transient(String),

    /// The authority refused the request as invalid.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The authority answered with a body that does not normalize.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Any failure of a client-side quiz operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

impl QuizError {
    /// Whether the session must be torn down and the user sent back to login.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            QuizError::Auth(AuthError::InvalidCredentials | AuthError::SessionExpired)
                | QuizError::Store(StoreError::Unauthorized)
        )
    }
}

/// Global Application Error Enum for the persistence service.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServerError(String),

    // 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    AuthError(String),

    // 403 Forbidden
    #[error("forbidden: {0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),

    // 409 Conflict (e.g., duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::UnsupportedFile(_) => AppError::BadRequest(err.to_string()),
            GenerationError::Processing(msg) => AppError::InternalServerError(msg),
        }
    }
}
