// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{NewQuiz, Quiz, QuizResult, ResultDraft},
    store::{QuizBackend, QuizScope, ResultScope},
};

/// Keeps quizzes and results in process memory.
///
/// Each write is applied under a single lock acquisition, so it is atomic
/// with respect to readers.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    quizzes: RwLock<Vec<Quiz>>,
    results: RwLock<Vec<QuizResult>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from already-recorded quizzes and results.
    pub fn with_data(quizzes: Vec<Quiz>, results: Vec<QuizResult>) -> Self {
        Self {
            quizzes: RwLock::new(quizzes),
            results: RwLock::new(results),
        }
    }
}

#[async_trait]
impl QuizBackend for MemoryBackend {
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError> {
        let quiz = quiz.clone().into_quiz(Uuid::new_v4().to_string(), Utc::now());
        self.quizzes.write().await.push(quiz.clone());
        Ok(quiz)
    }

    async fn list_quizzes(&self, scope: QuizScope<'_>) -> Result<Vec<Quiz>, StoreError> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes.iter().filter(|q| scope.includes(q)).cloned().collect())
    }

    async fn create_result(&self, draft: &ResultDraft) -> Result<QuizResult, StoreError> {
        let known_quiz = self
            .quizzes
            .read()
            .await
            .iter()
            .any(|q| q.id == draft.quiz_id());
        if !known_quiz {
            return Err(StoreError::NotFound(format!("quiz {}", draft.quiz_id())));
        }

        let result = draft.clone().into_result(Uuid::new_v4().to_string());
        self.results.write().await.push(result.clone());
        Ok(result)
    }

    async fn list_results(&self, scope: ResultScope<'_>) -> Result<Vec<QuizResult>, StoreError> {
        let results = self.results.read().await;
        Ok(results.iter().filter(|r| scope.includes(r)).cloned().collect())
    }
}
