// src/store/remote.rs

use async_trait::async_trait;

use crate::{
    client::ApiClient,
    error::StoreError,
    models::{NewQuiz, Quiz, QuizResult, ResultDraft},
    store::{
        QuizBackend, QuizScope, ResultScope,
        wire::{WireQuiz, WireResult, normalize_all},
    },
};

/// Talks to the persistence service over HTTP.
///
/// Scopes that name a user are answered by the service for the token's
/// owner; the service is the authority on who that is.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: ApiClient,
}

impl RemoteBackend {
    /// `client` must already carry the session's bearer token.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuizBackend for RemoteBackend {
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError> {
        let body = serde_json::json!({
            "title": quiz.title,
            "source_file_name": quiz.source_file_name,
            "question_kind": quiz.question_kind,
            "questions": quiz.questions,
        });
        let wire: WireQuiz = self.client.post_json("api/v1/quizzes", &body).await?;
        Quiz::try_from(wire)
    }

    async fn list_quizzes(&self, scope: QuizScope<'_>) -> Result<Vec<Quiz>, StoreError> {
        let path = match scope {
            QuizScope::Published => "api/v1/quizzes",
            QuizScope::OwnedBy(_) => "api/v1/quizzes/my-quizzes",
        };
        let wire: Vec<WireQuiz> = self.client.get_json(path).await?;
        let quizzes: Vec<Quiz> = normalize_all(wire)?;

        // The service answers for the token's owner; keep the scope honest.
        Ok(quizzes.into_iter().filter(|q| scope.includes(q)).collect())
    }

    async fn create_result(&self, draft: &ResultDraft) -> Result<QuizResult, StoreError> {
        let wire: WireResult = self.client.post_json("api/v1/results", draft).await?;
        QuizResult::try_from(wire)
    }

    async fn list_results(&self, scope: ResultScope<'_>) -> Result<Vec<QuizResult>, StoreError> {
        let path = match scope {
            ResultScope::Student(_) => "api/v1/results/my-results",
            ResultScope::All => "api/v1/results/all",
        };
        let wire: Vec<WireResult> = self.client.get_json(path).await?;
        let results: Vec<QuizResult> = normalize_all(wire)?;
        Ok(results.into_iter().filter(|r| scope.includes(r)).collect())
    }
}
