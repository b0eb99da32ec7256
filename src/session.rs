// src/session.rs

//! The signed-in context: who the user is, their token, and their quiz store.
//!
//! A session exists only between a successful login and logout. Anything that
//! needs the current user or the store is handed the session explicitly.

use chrono::{DateTime, Utc};

use crate::{
    attempt::Attempt,
    error::{AuthError, QuizError},
    models::{QuestionKind, Quiz, QuizResult, Role, quiz::title_from_file_name},
    services::{AuthService, AuthenticatedUser, QuestionGenerator, SourceDocument},
    store::{DashboardScope, QuizBackend, QuizStore, ViewTicket},
};

pub struct Session<B> {
    user: AuthenticatedUser,
    store: QuizStore<B>,
}

impl<B: QuizBackend> Session<B> {
    pub fn new(user: AuthenticatedUser, backend: B) -> Self {
        Self {
            user,
            store: QuizStore::new(backend),
        }
    }

    /// Signs in and builds the session's backend from the authenticated user.
    pub async fn login<A, F>(auth: &A, email: &str, password: &str, role: Role, connect: F) -> Result<Self, QuizError>
    where
        A: AuthService + ?Sized,
        F: FnOnce(&AuthenticatedUser) -> B,
    {
        let user = auth.login(email, password, role).await?;
        let backend = connect(&user);
        Ok(Self::new(user, backend))
    }

    /// Rebuilds a session from a stored token.
    pub async fn resume<A, F>(auth: &A, token: &str, connect: F) -> Result<Self, QuizError>
    where
        A: AuthService + ?Sized,
        F: FnOnce(&AuthenticatedUser) -> B,
    {
        let user = auth.current_user(token).await?;
        let backend = connect(&user);
        Ok(Self::new(user, backend))
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn token(&self) -> &str {
        &self.user.token
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn store(&self) -> &QuizStore<B> {
        &self.store
    }

    /// The dashboard this user lands on.
    pub fn dashboard_scope(&self) -> DashboardScope {
        match self.user.role {
            Role::Teacher => DashboardScope::Teacher {
                owner_id: self.user.user_id.clone(),
            },
            Role::Student => DashboardScope::Student {
                student_id: self.user.user_id.clone(),
            },
        }
    }

    /// Enters the user's dashboard and loads it once.
    ///
    /// On failure the view stays entered but empty. To retry, take a ticket
    /// from [`enter_dashboard`](Self::enter_dashboard) and `store().refresh` it.
    pub async fn open_dashboard(&self) -> Result<ViewTicket, QuizError> {
        let ticket = self.enter_dashboard().await;
        self.store.refresh(&ticket).await?;
        Ok(ticket)
    }

    pub async fn enter_dashboard(&self) -> ViewTicket {
        self.store.enter_dashboard(self.dashboard_scope()).await
    }

    /// Generates questions from a document and publishes them as a quiz.
    ///
    /// The quiz title is the file name without its `.pdf` extension.
    pub async fn publish_document<G>(
        &self,
        ticket: &ViewTicket,
        generator: &G,
        document: &SourceDocument,
        kind: QuestionKind,
    ) -> Result<Quiz, QuizError>
    where
        G: QuestionGenerator + ?Sized,
    {
        self.require(Role::Teacher)?;

        let questions = generator.generate(document, kind).await?;
        let title = title_from_file_name(&document.file_name);
        self.store
            .create_quiz(ticket, &self.user.user_id, &title, &document.file_name, kind, questions)
            .await
    }

    /// Starts an attempt on a quiz from the student's list.
    pub fn start_attempt(&self, quiz: &Quiz, now: DateTime<Utc>) -> Result<Attempt, QuizError> {
        self.require(Role::Student)?;

        let mut attempt = Attempt::new(quiz.clone());
        attempt.start(now)?;
        Ok(attempt)
    }

    /// Submits a completed attempt. The attempt is kept by the caller, so a
    /// failed submission can simply be repeated.
    pub async fn submit_attempt(&self, ticket: &ViewTicket, attempt: &Attempt) -> Result<QuizResult, QuizError> {
        let student = self.user.student_identity()?;
        let draft = attempt.finish(&student)?;
        Ok(self.store.submit_result(ticket, &draft).await?)
    }

    /// Ends the session. Pending dashboard loads are discarded.
    pub async fn logout(self) {
        self.store.leave_dashboard().await;
        tracing::info!("Signed out {}", self.user.email);
    }

    fn require(&self, role: Role) -> Result<(), AuthError> {
        if self.user.role == role {
            Ok(())
        } else {
            Err(AuthError::WrongRole(role))
        }
    }
}
