// src/services/mod.rs

pub mod auth;
pub mod generation;

pub use auth::{AuthService, AuthenticatedUser, RemoteAuth};
pub use generation::{MockQuestionGenerator, QuestionGenerator, RemoteQuestionGenerator, SourceDocument};
