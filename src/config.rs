// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Persistence service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = parsed("JWT_EXPIRATION", 60 * 60 * 24)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let port = parsed("PORT", 8000)?;
        let max_upload_bytes = parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            cors_origins,
            max_upload_bytes,
        })
    }
}

/// Where the client core finds the persistence service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Always ends with `/` so relative API paths join under it.
    pub api_base_url: Url,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: &str, request_timeout: Duration) -> Result<Self, ConfigError> {
        let mut base = api_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base_url = Url::parse(&base).map_err(|e| ConfigError::Invalid {
            name: "QUIZ_API_URL",
            reason: e.to_string(),
        })?;

        Ok(Self {
            api_base_url,
            request_timeout,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let base = env::var("QUIZ_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let timeout_secs = parsed("QUIZ_API_TIMEOUT_SECS", 15)?;

        Self::new(&base, Duration::from_secs(timeout_secs))
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_base_url_gets_trailing_slash() {
        let config = ClientConfig::new("http://127.0.0.1:9000/quiz", Duration::from_secs(1)).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9000/quiz/");
        assert_eq!(
            config.api_base_url.join("api/v1/quizzes").unwrap().as_str(),
            "http://127.0.0.1:9000/quiz/api/v1/quizzes"
        );
        assert!(ClientConfig::new("not a url", Duration::from_secs(1)).is_err());
    }
}
