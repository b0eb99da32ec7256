// tests/remote_store_tests.rs
//
// Drives the HTTP-backed store and auth against an in-process stub of the
// persistence service that answers in the older camelCase dialect.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use chrono::Utc;
use pdfquiz::{
    Session,
    attempt::AttemptState,
    client::ApiClient,
    config::ClientConfig,
    error::{AuthError, QuizError, StoreError},
    models::{QuestionKind, Role},
    services::RemoteAuth,
    store::{QuizBackend, QuizScope, RemoteBackend},
};
use serde_json::{Value, json};

const TOKEN: &str = "tok-7";

#[derive(Clone, Default)]
struct Authority {
    results: Arc<Mutex<Vec<Value>>>,
    unavailable: Arc<AtomicBool>,
}

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> Result<(), Reply> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match bearer {
        Some(TOKEN) => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" })))),
    }
}

fn available(authority: &Authority) -> Result<(), Reply> {
    if authority.unavailable.load(Ordering::SeqCst) {
        return Err((StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "detail": "maintenance" }))));
    }
    Ok(())
}

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, Reply> {
    if body["password"] != "secret" {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Incorrect email or password" }))));
    }
    // No user object: the client must follow up with /users/me
    Ok(Json(json!({ "access_token": TOKEN, "token_type": "bearer" })))
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    Ok(Json(json!({
        "id": 7,
        "name": "Ada",
        "email": "ada@example.com",
        "type": "student",
        "studentNumber": "S-7"
    })))
}

async fn quizzes(State(authority): State<Authority>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    available(&authority)?;
    Ok(Json(json!([{
        "id": 1,
        "title": "Cells",
        "fileName": "cells.pdf",
        "questionType": "multiple_choice",
        "createdBy": 3,
        "isPublished": true,
        "createdAt": "2024-05-01T10:00:00",
        "questions": [
            { "id": 1, "question": "Powerhouse?", "options": ["Nucleus", "Mitochondria"], "correctAnswer": 1 },
            { "id": 2, "question": "Holds DNA?", "options": ["Nucleus", "Ribosome"], "correctAnswer": 0 }
        ]
    }])))
}

async fn my_results(State(authority): State<Authority>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    available(&authority)?;
    Ok(Json(Value::Array(authority.results.lock().unwrap().clone())))
}

async fn create_result(
    State(authority): State<Authority>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    authorized(&headers)?;
    available(&authority)?;

    let mut results = authority.results.lock().unwrap();
    let record = json!({
        "id": results.len() + 100,
        "quizId": body["quiz_id"],
        "studentId": body["student_id"],
        "studentName": body["student_name"],
        "studentNumber": body["student_number"],
        "answers": body["answers"],
        "score": body["score"],
        "totalQuestions": body["total_questions"],
        "completedAt": Utc::now().timestamp_millis(),
        "timeSpent": body["time_spent_ms"],
    });
    results.push(record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn spawn_authority() -> (String, Authority) {
    let authority = Authority::default();
    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/users/me", get(me))
        .route("/api/v1/quizzes", get(quizzes))
        .route("/api/v1/results", post(create_result))
        .route("/api/v1/results/my-results", get(my_results))
        .with_state(authority.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, authority)
}

fn client_for(address: &str) -> ApiClient {
    let config = ClientConfig::new(address, Duration::from_secs(5)).unwrap();
    ApiClient::new(&config).unwrap()
}

async fn student_session(address: &str) -> Session<RemoteBackend> {
    let client = client_for(address);
    let auth = RemoteAuth::new(client.clone());
    Session::login(&auth, "ada@example.com", "secret", Role::Student, |user| {
        RemoteBackend::new(client.with_token(&user.token))
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn student_flow_over_camel_case_service() {
    let (address, _authority) = spawn_authority().await;
    let session = student_session(&address).await;

    assert_eq!(session.user().user_id, "7");
    assert_eq!(session.user().student_number.as_deref(), Some("S-7"));

    let ticket = session.open_dashboard().await.unwrap();
    let quizzes = session.store().quizzes().await;
    assert_eq!(quizzes.len(), 1);
    let quiz = &quizzes[0];
    assert_eq!(quiz.id, "1");
    assert_eq!(quiz.owner_id, "3");
    assert_eq!(quiz.question_kind, QuestionKind::MultipleChoice);
    assert_eq!(quiz.questions[0].correct_option_index, 1);
    assert!(!session.store().is_quiz_completed("1").await);

    // One right, one wrong
    let now = Utc::now();
    let mut attempt = session.start_attempt(quiz, now).unwrap();
    assert!(attempt.select_option(1, now).unwrap().is_correct);
    attempt.advance(now).unwrap();
    assert!(!attempt.select_option(1, now).unwrap().is_correct);
    assert_eq!(attempt.advance(now).unwrap(), AttemptState::Completed);

    let result = session.submit_attempt(&ticket, &attempt).await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(result.total_questions, 2);
    assert_eq!(result.percentage(), 50);
    assert_eq!(result.answers.len(), 2);

    assert_eq!(session.store().results().await.len(), 1);
    assert!(session.store().is_quiz_completed("1").await);
}

#[tokio::test]
async fn wrong_password_and_stale_token_send_user_to_login() {
    let (address, _authority) = spawn_authority().await;
    let client = client_for(&address);
    let auth = RemoteAuth::new(client.clone());

    let err = Session::login(&auth, "ada@example.com", "nope", Role::Student, |user| {
        RemoteBackend::new(client.with_token(&user.token))
    })
    .await
    .err()
    .unwrap();
    assert!(matches!(err, QuizError::Auth(AuthError::InvalidCredentials)));
    assert!(err.requires_login());

    let err = Session::resume(&auth, "expired", |user| RemoteBackend::new(client.with_token(&user.token)))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, QuizError::Auth(AuthError::SessionExpired)));
}

#[tokio::test]
async fn role_mismatch_is_rejected() {
    let (address, _authority) = spawn_authority().await;
    let client = client_for(&address);
    let auth = RemoteAuth::new(client.clone());

    let err = Session::login(&auth, "ada@example.com", "secret", Role::Teacher, |user| {
        RemoteBackend::new(client.with_token(&user.token))
    })
    .await
    .err()
    .unwrap();
    assert!(matches!(err, QuizError::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn unauthorized_reads_map_to_unauthorized() {
    let (address, _authority) = spawn_authority().await;
    let backend = RemoteBackend::new(client_for(&address).with_token("someone-else"));

    let err = backend.list_quizzes(QuizScope::Published).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));
    assert!(QuizError::from(err).requires_login());
}

#[tokio::test]
async fn outage_is_transient_and_keeps_last_snapshot() {
    let (address, authority) = spawn_authority().await;
    let session = student_session(&address).await;
    let ticket = session.open_dashboard().await.unwrap();
    assert_eq!(session.store().quizzes().await.len(), 1);

    authority.unavailable.store(true, Ordering::SeqCst);
    let err = session.store().refresh(&ticket).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(session.store().quizzes().await.len(), 1);

    // Submitting during the outage fails and can be retried afterwards
    let quiz = session.store().quizzes().await.remove(0);
    let now = Utc::now();
    let mut attempt = session.start_attempt(&quiz, now).unwrap();
    attempt.select_option(0, now).unwrap();
    attempt.advance(now).unwrap();
    attempt.select_option(0, now).unwrap();
    attempt.advance(now).unwrap();

    assert!(session.submit_attempt(&ticket, &attempt).await.is_err());
    assert!(session.store().results().await.is_empty());

    authority.unavailable.store(false, Ordering::SeqCst);
    let result = session.submit_attempt(&ticket, &attempt).await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(session.store().results().await.len(), 1);
}
