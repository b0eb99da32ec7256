// src/routes.rs

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, files, quizzes, results, users},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

async fn banner() -> Json<Value> {
    Json(json!({
        "message": "PDF Quiz API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Assembles the main application router.
///
/// * Public: banner, register, login.
/// * Bearer: profile, quiz listing and lookup, own results.
/// * Teacher: quiz creation, uploads, all results.
/// * Student: result submission.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new().route("/me", get(users::me));

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_published))
        .route("/{id}", get(quizzes::get_quiz))
        .merge(
            Router::new()
                .route("/", post(quizzes::create_quiz))
                .route("/my-quizzes", get(quizzes::list_mine))
                .layer(middleware::from_fn(teacher_middleware)),
        );

    let result_routes = Router::new()
        .route("/my-results", get(results::my_results))
        .merge(
            Router::new()
                .route("/", post(results::create_result))
                .layer(middleware::from_fn(student_middleware)),
        )
        .merge(
            Router::new()
                .route("/all", get(results::all_results))
                .route("/quiz/{id}", get(results::quiz_results))
                .layer(middleware::from_fn(teacher_middleware)),
        );

    let file_routes = Router::new()
        .route("/generate", post(files::generate))
        .route("/upload", post(files::upload))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(teacher_middleware));

    // Everything below requires a valid bearer token
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/quizzes", quiz_routes)
        .nest("/results", result_routes)
        .nest("/files", file_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new().nest("/auth", auth_routes).merge(protected);

    Router::new()
        .route("/", get(banner))
        .nest("/api/v1", api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
