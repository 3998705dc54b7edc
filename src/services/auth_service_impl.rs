//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::auth::MIN_PASSWORD_LENGTH;
use crate::db::Store;
use crate::models::user::{NewUser, User};
use crate::services::auth_service::{AuthError, AuthService, AuthSession};
use crate::services::token::{Claims, JwtService};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: JwtService,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens: JwtService::from_config(&security),
            security,
        }
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }
}

/// Trims every field and rejects blanks.
fn normalize(new_user: NewUser) -> Result<NewUser, AuthError> {
    let required = [
        ("firstName", new_user.first_name.trim()),
        ("lastName", new_user.last_name.trim()),
        ("email", new_user.email.trim()),
        ("password", new_user.password.as_str()),
        ("role", new_user.role.trim()),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AuthError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if !new_user.email.contains('@') {
        return Err(AuthError::Validation("Email address is not valid".to_string()));
    }

    if new_user.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(NewUser {
        first_name: new_user.first_name.trim().to_string(),
        last_name: new_user.last_name.trim().to_string(),
        role: new_user.role.trim().to_string(),
        email: new_user.email.trim().to_string(),
        password: new_user.password,
    })
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sea_orm::DbErr>().is_some_and(|db_err| {
        matches!(
            db_err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        )
    })
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, new_user: NewUser) -> Result<AuthSession, AuthError> {
        let new_user = normalize(new_user)?;

        if self.store.get_user_by_email(&new_user.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let user = match self.store.create_user(new_user, &self.security).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                warn!("Concurrent registration hit the unique email constraint");
                return Err(AuthError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, role = %user.role, "User registered");
        self.session_for(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .store
            .verify_user_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        info!(user_id = user.id, "User logged in");
        self.session_for(user)
    }

    fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens
            .validate(token)
            .map_err(|_| AuthError::InvalidToken)
    }

    async fn current_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let id = claims.user_id().ok_or(AuthError::InvalidToken)?;
        self.store.get_user(id).await?.ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, password: &str) -> NewUser {
        NewUser {
            first_name: " Anna ".to_string(),
            last_name: "Nowak".to_string(),
            role: "Nurse".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn service() -> SeaOrmAuthService {
        let path = std::env::temp_dir().join(format!("ornotes-auth-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display())).await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            jwt_secret: "test-secret".to_string(),
            ..SecurityConfig::default()
        };
        SeaOrmAuthService::new(store, security)
    }

    #[test]
    fn test_normalize_rejects_blank_fields() {
        let mut user = new_user("anna@example.com", "securepass");
        user.last_name = "   ".to_string();
        user.role = String::new();

        let err = normalize(user).unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref msg) if msg.contains("lastName") && msg.contains("role")));
    }

    #[test]
    fn test_normalize_trims() {
        let user = normalize(new_user(" anna@example.com ", "securepass")).unwrap();
        assert_eq!(user.first_name, "Anna");
        assert_eq!(user.email, "anna@example.com");
    }

    #[test]
    fn test_normalize_rejects_short_password() {
        assert!(matches!(
            normalize(new_user("anna@example.com", "short")),
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_login_roundtrip() {
        let service = service().await;
        let registered = service
            .register(new_user("anna@example.com", "securepass"))
            .await
            .unwrap();

        let session = service.login("anna@example.com", "securepass").await.unwrap();
        let claims = service.verify_token(&session.token).unwrap();

        assert_eq!(claims.user_id(), Some(registered.user.id));
        assert_eq!(claims.email, "anna@example.com");
        assert_eq!(claims.name, "Anna Nowak");
        assert_eq!(claims.role, "Nurse");
        assert_eq!(service.current_user(&claims).await.unwrap(), registered.user);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_bad_credentials() {
        let service = service().await;
        service
            .register(new_user("anna@example.com", "securepass"))
            .await
            .unwrap();

        assert!(matches!(
            service.register(new_user("anna@example.com", "otherpass")).await,
            Err(AuthError::DuplicateEmail)
        ));
        assert!(matches!(
            service.login("anna@example.com", "wrongpass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "securepass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.verify_token("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }
}
