// src/store/mod.rs

//! The quiz store: the client's view of quizzes and results, reconciled with
//! an authoritative backend.
//!
//! Writes are confirm-then-update: nothing is added locally until the backend
//! has recorded it, and after every confirmed write the snapshot is reloaded
//! wholesale. Dashboard loads carry a [`ViewTicket`]; a response that comes
//! back after the user has moved to another view is dropped.

pub mod memory;
pub mod remote;
pub mod wire;

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{QuizError, StoreError},
    models::{NewQuiz, Question, QuestionKind, Quiz, QuizResult, ResultDraft},
};

pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

/// Which quizzes a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizScope<'a> {
    /// Everything published. What students see.
    Published,
    /// Quizzes created by this teacher.
    OwnedBy(&'a str),
}

impl QuizScope<'_> {
    pub fn includes(&self, quiz: &Quiz) -> bool {
        match self {
            QuizScope::Published => quiz.is_published,
            QuizScope::OwnedBy(owner_id) => quiz.owner_id == *owner_id,
        }
    }
}

/// Which results a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultScope<'a> {
    Student(&'a str),
    /// Every result on every quiz. What teachers see.
    All,
}

impl ResultScope<'_> {
    pub fn includes(&self, result: &QuizResult) -> bool {
        match self {
            ResultScope::Student(student_id) => result.student_id == *student_id,
            ResultScope::All => true,
        }
    }
}

/// The persistence authority behind a [`QuizStore`].
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Records a quiz and returns it with its assigned id and timestamp.
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError>;

    async fn list_quizzes(&self, scope: QuizScope<'_>) -> Result<Vec<Quiz>, StoreError>;

    /// Records a result and returns it with its canonical id.
    async fn create_result(&self, draft: &ResultDraft) -> Result<QuizResult, StoreError>;

    async fn list_results(&self, scope: ResultScope<'_>) -> Result<Vec<QuizResult>, StoreError>;
}

/// Several sessions can share one backend.
#[async_trait]
impl<B: QuizBackend + ?Sized> QuizBackend for Arc<B> {
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError> {
        (**self).create_quiz(quiz).await
    }

    async fn list_quizzes(&self, scope: QuizScope<'_>) -> Result<Vec<Quiz>, StoreError> {
        (**self).list_quizzes(scope).await
    }

    async fn create_result(&self, draft: &ResultDraft) -> Result<QuizResult, StoreError> {
        (**self).create_result(draft).await
    }

    async fn list_results(&self, scope: ResultScope<'_>) -> Result<Vec<QuizResult>, StoreError> {
        (**self).list_results(scope).await
    }
}

/// Which dashboard the snapshot is loaded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardScope {
    /// All published quizzes and this student's results.
    Student { student_id: String },
    /// This teacher's quizzes and every result.
    Teacher { owner_id: String },
}

/// Proof that a view was entered. Stale once another view is entered or the
/// dashboard is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTicket {
    generation: u64,
    scope: DashboardScope,
}

impl ViewTicket {
    pub fn scope(&self) -> &DashboardScope {
        &self.scope
    }
}

/// What happened to a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Applied,
    /// The view changed while the request was in flight; nothing was applied.
    Stale,
}

#[derive(Debug, Default)]
struct Snapshot {
    generation: u64,
    loaded: bool,
    quizzes: Vec<Quiz>,
    results: Vec<QuizResult>,
}

/// Decrements the in-flight counter however the request ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct QuizStore<B> {
    backend: B,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    snapshot: RwLock<Snapshot>,
}

impl<B: QuizBackend> QuizStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Switches the snapshot to a dashboard. Call [`refresh`](Self::refresh)
    /// with the returned ticket to load it.
    pub async fn enter_dashboard(&self, scope: DashboardScope) -> ViewTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.snapshot.write().await = Snapshot {
            generation,
            ..Snapshot::default()
        };
        tracing::debug!("Entered dashboard {:?} (view {})", scope, generation);
        ViewTicket { generation, scope }
    }

    /// Leaves the current dashboard; in-flight loads for it are discarded.
    pub async fn leave_dashboard(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.snapshot.write().await = Snapshot {
            generation,
            ..Snapshot::default()
        };
    }

    pub fn is_current(&self, ticket: &ViewTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Whether any backend call is in flight.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Whether the current view has been loaded at least once.
    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.loaded
    }

    /// Quizzes of the current view, in backend order.
    pub async fn quizzes(&self) -> Vec<Quiz> {
        self.snapshot.read().await.quizzes.clone()
    }

    /// Results of the current view, in backend order.
    pub async fn results(&self) -> Vec<QuizResult> {
        self.snapshot.read().await.results.clone()
    }

    /// The first recorded result for `quiz_id` in the current view.
    pub async fn result_for_quiz(&self, quiz_id: &str) -> Option<QuizResult> {
        self.snapshot
            .read()
            .await
            .results
            .iter()
            .find(|r| r.quiz_id == quiz_id)
            .cloned()
    }

    pub async fn is_quiz_completed(&self, quiz_id: &str) -> bool {
        self.result_for_quiz(quiz_id).await.is_some()
    }

    /// Reloads quizzes and results for the ticket's dashboard.
    pub async fn refresh(&self, ticket: &ViewTicket) -> Result<Refresh, StoreError> {
        if !self.is_current(ticket) {
            return Ok(Refresh::Stale);
        }

        let (quizzes, results) = match &ticket.scope {
            DashboardScope::Student { student_id } => {
                let quizzes = self.list_quizzes_for_student().await?;
                let results = self.list_results_for_student(student_id).await?;
                (quizzes, results)
            }
            DashboardScope::Teacher { owner_id } => {
                let quizzes = self.list_quizzes_for_teacher(owner_id).await?;
                let results = self.list_results_for_teacher().await?;
                (quizzes, results)
            }
        };

        let mut snapshot = self.snapshot.write().await;
        if snapshot.generation != ticket.generation || !self.is_current(ticket) {
            tracing::debug!("Discarding stale load for view {}", ticket.generation);
            return Ok(Refresh::Stale);
        }
        snapshot.quizzes = quizzes;
        snapshot.results = results;
        snapshot.loaded = true;
        Ok(Refresh::Applied)
    }

    pub async fn list_quizzes_for_student(&self) -> Result<Vec<Quiz>, StoreError> {
        let _guard = InFlight::begin(&self.in_flight);
        self.backend.list_quizzes(QuizScope::Published).await
    }

    pub async fn list_quizzes_for_teacher(&self, owner_id: &str) -> Result<Vec<Quiz>, StoreError> {
        let _guard = InFlight::begin(&self.in_flight);
        self.backend.list_quizzes(QuizScope::OwnedBy(owner_id)).await
    }

    pub async fn list_results_for_student(&self, student_id: &str) -> Result<Vec<QuizResult>, StoreError> {
        let _guard = InFlight::begin(&self.in_flight);
        self.backend.list_results(ResultScope::Student(student_id)).await
    }

    pub async fn list_results_for_teacher(&self) -> Result<Vec<QuizResult>, StoreError> {
        let _guard = InFlight::begin(&self.in_flight);
        self.backend.list_results(ResultScope::All).await
    }

    /// Records a new published quiz.
    ///
    /// Nothing changes locally unless the backend confirms the write. A
    /// failed reload after a confirmed write is logged and leaves the old
    /// snapshot in place; the quiz itself is recorded.
    pub async fn create_quiz(
        &self,
        ticket: &ViewTicket,
        owner_id: &str,
        title: &str,
        source_file_name: &str,
        question_kind: QuestionKind,
        questions: Vec<Question>,
    ) -> Result<Quiz, QuizError> {
        let new_quiz = NewQuiz::published(owner_id, title.trim(), source_file_name.trim(), question_kind, questions);
        new_quiz.validate()?;

        let quiz = {
            let _guard = InFlight::begin(&self.in_flight);
            self.backend.create_quiz(&new_quiz).await?
        };
        tracing::info!("Quiz {} published by {}", quiz.id, quiz.owner_id);

        self.reload_after_write(ticket).await;
        Ok(quiz)
    }

    /// Records a completed attempt's result.
    ///
    /// On failure the draft is untouched and can be submitted again.
    pub async fn submit_result(&self, ticket: &ViewTicket, draft: &ResultDraft) -> Result<QuizResult, StoreError> {
        let result = {
            let _guard = InFlight::begin(&self.in_flight);
            self.backend.create_result(draft).await?
        };
        tracing::info!("Result {} recorded for quiz {}", result.id, result.quiz_id);

        self.reload_after_write(ticket).await;
        Ok(result)
    }

    async fn reload_after_write(&self, ticket: &ViewTicket) {
        match self.refresh(ticket).await {
            Ok(_) => {}
            Err(e) => tracing::warn!("Reload after write failed: {}", e),
        }
    }
}
