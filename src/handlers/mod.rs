// src/handlers/mod.rs

pub mod auth;
pub mod files;
pub mod quizzes;
pub mod results;
pub mod users;
