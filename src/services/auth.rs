// src/services/auth.rs

use async_trait::async_trait;

use crate::{
    attempt::StudentIdentity,
    client::ApiClient,
    error::AuthError,
    models::{Role, UserProfile, user::LoginRequest},
    store::wire::{WireLogin, WireUser},
};

/// The identity a session is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub student_number: Option<String>,
}

impl AuthenticatedUser {
    pub fn from_profile(token: String, profile: UserProfile) -> Self {
        Self {
            token,
            user_id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            student_number: profile.student_number,
        }
    }

    /// The student a result is recorded for. Teachers have none.
    pub fn student_identity(&self) -> Result<StudentIdentity, AuthError> {
        if self.role != Role::Student {
            return Err(AuthError::WrongRole(Role::Student));
        }
        Ok(StudentIdentity {
            id: self.user_id.clone(),
            name: self.name.clone(),
            student_number: self.student_number.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str, role: Role) -> Result<AuthenticatedUser, AuthError>;

    /// Resolves a token back to its user. Expired tokens fail.
    async fn current_user(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Auth against the persistence service.
#[derive(Debug, Clone)]
pub struct RemoteAuth {
    client: ApiClient,
}

impl RemoteAuth {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for RemoteAuth {
    async fn login(&self, email: &str, password: &str, role: Role) -> Result<AuthenticatedUser, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            role,
        };
        let login: WireLogin = self.client.post_json("api/v1/auth/login", &request).await?;

        let user = match login.user {
            Some(user) => AuthenticatedUser::from_profile(login.token, user.into()),
            None => self.current_user(&login.token).await?,
        };
        if user.role != role {
            return Err(AuthError::InvalidCredentials);
        }
        tracing::info!("Signed in as {} ({})", user.email, user.role);
        Ok(user)
    }

    async fn current_user(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let user: WireUser = self
            .client
            .get_json_with_token("api/v1/users/me", token)
            .await
            .map_err(|e| match AuthError::from(e) {
                AuthError::InvalidCredentials => AuthError::SessionExpired,
                other => other,
            })?;
        Ok(AuthenticatedUser::from_profile(token.to_string(), user.into()))
    }
}
