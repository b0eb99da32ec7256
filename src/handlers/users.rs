// src/handlers/users.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::user::User, utils::jwt::Claims};

/// Returns the profile of the token's owner.
pub async fn me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, student_number, created_at FROM users WHERE id = $1",
    )
    .bind(&claims.sub)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

    let profile = user
        .profile()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(profile))
}
