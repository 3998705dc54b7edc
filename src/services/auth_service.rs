//! Domain service for registration, login and bearer-token checks.

use serde::Serialize;
use thiserror::Error;

use crate::models::user::{NewUser, User};
use crate::services::token::Claims;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Token plus the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates the account and signs the user in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for blank fields and
    /// [`AuthError::DuplicateEmail`] if the email is taken, including when a
    /// concurrent registration wins the race.
    async fn register(&self, new_user: NewUser) -> Result<AuthSession, AuthError>;

    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email and for
    /// a wrong password alike.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Decodes a bearer token.
    fn verify_token(&self, token: &str) -> Result<Claims, AuthError>;

    /// Loads the user a token was issued for.
    async fn current_user(&self, claims: &Claims) -> Result<User, AuthError>;
}
