//! HS256 bearer tokens for the API.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::constants;
use crate::models::user::User;

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Display name, "First Last"
    pub name: String,
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Clone)]
pub struct JwtService {
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            lifetime,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    #[must_use]
    pub fn from_config(security: &SecurityConfig) -> Self {
        let minutes = security
            .token_lifetime_minutes
            .min(constants::auth::MAX_TOKEN_LIFETIME_MINUTES);
        let minutes = i64::try_from(minutes).unwrap_or(1);
        Self::new(&security.jwt_secret, Duration::minutes(minutes))
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name(),
            role: user.role.clone(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to encode access token")
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid access token")?;

        Ok(data.claims)
    }

    #[must_use]
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            first_name: "Anna".to_string(),
            last_name: "Nowak".to_string(),
            role: "Nurse".to_string(),
            email: "anna@example.com".to_string(),
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let service = JwtService::new("test-secret-key-for-testing", Duration::minutes(60));
        let token = service.issue(&user()).unwrap();

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.email, "anna@example.com");
        assert_eq!(claims.name, "Anna Nowak");
        assert_eq!(claims.role, "Nurse");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(service.lifetime_secs(), 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtService::new("secret-one", Duration::minutes(60));
        let verifier = JwtService::new("secret-two", Duration::minutes(60));
        let token = issuer.issue(&user()).unwrap();
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60 second leeway
        let service = JwtService::new("secret", Duration::minutes(-5));
        let token = service.issue(&user()).unwrap();
        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let service = JwtService::new("secret", Duration::minutes(60));
        assert!(service.validate("not.a.token").is_err());
    }
}
