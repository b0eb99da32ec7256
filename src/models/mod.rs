// src/models/mod.rs

pub mod question;
pub mod quiz;
pub mod quiz_result;
pub mod user;

pub use question::{Question, QuestionKind};
pub use quiz::{NewQuiz, Quiz};
pub use quiz_result::{Answer, QuizResult, ResultDraft};
pub use user::{Role, UserProfile};
