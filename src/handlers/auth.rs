// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        Role,
        user::{LoginRequest, LoginResponse, RegisterRequest, User},
    },
    utils::{
        hash::{hash_password, verify_password},
        html::clean_html,
        jwt::sign_jwt,
    },
};

/// Registers a new teacher or student.
///
/// Students must supply a student number; teachers never store one.
/// Returns 201 Created and the user profile (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student_number = match payload.role {
        Role::Student => {
            let number = payload
                .student_number
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| AppError::BadRequest("Students must provide a student number".to_string()))?;
            Some(clean_html(number))
        }
        Role::Teacher => None,
    };

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password, role, student_number)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, email, password, role, student_number, created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(clean_html(payload.name.trim()))
    .bind(&email)
    .bind(hashed_password)
    .bind(payload.role.as_str())
    .bind(student_number)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let profile = user
        .profile()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tracing::info!("Registered {} {}", profile.role, profile.email);

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Authenticates a user and returns a JWT token.
///
/// The requested role must match the account's role; a mismatch is reported
/// exactly like a wrong password.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, student_number, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let invalid = || AppError::AuthError("Incorrect email, password or role".to_string());

    let user = user.ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid());
    }

    let profile = user
        .profile()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if profile.role != payload.role {
        return Err(invalid());
    }

    let token = sign_jwt(&profile.id, profile.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(LoginResponse {
        token,
        token_type: "bearer".to_string(),
        user: profile,
    }))
}
