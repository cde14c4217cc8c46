//! Admin authentication: Argon2id password hashes and HS256 session tokens.

use std::collections::HashSet;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use db::models::user::{User, UserRole};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::config::AuthConfig;

const SESSION_AUDIENCE: &str = "portfolio-admin";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid session token")]
    InvalidToken,
    #[error("Session expired")]
    TokenExpired,
    #[error("Admin access required")]
    Forbidden,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Hash a password as a PHC string (Argon2id, random salt)
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    email: String,
    role: UserRole,
    iat: i64,
    exp: i64,
    aud: String,
}

/// A verified session
#[derive(Debug, Clone, Serialize, TS)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct SessionTokenService {
    /// Base64 encoded HMAC secret
    secret: SecretString,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("secret", &"<secret>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionTokenService {
    pub fn new(secret: SecretString, ttl: chrono::Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_secret.clone(), config.session_ttl)
    }

    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: SESSION_AUDIENCE.to_string(),
        };

        let encoding_key = EncodingKey::from_base64_secret(self.secret.expose_secret())?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)?;
        Ok((token, expires_at))
    }

    pub fn validate(&self, token: &str) -> Result<Session, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_audience(&[SESSION_AUDIENCE]);
        validation.required_spec_claims = HashSet::from([
            "sub".to_string(),
            "exp".to_string(),
            "aud".to_string(),
        ]);
        validation.leeway = 30;

        let decoding_key = DecodingKey::from_base64_secret(self.secret.expose_secret())?;
        let claims = decode::<SessionClaims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}

/// Check credentials and issue a session for an admin user
pub async fn login(
    pool: &SqlitePool,
    sessions: &SessionTokenService,
    request: &LoginRequest,
) -> Result<LoginResponse, AuthError> {
    let user = User::find_by_email(pool, &request.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::warn!(email = %user.email, "Failed login attempt");
        return Err(AuthError::InvalidCredentials);
    }
    if user.role != UserRole::Admin {
        return Err(AuthError::Forbidden);
    }

    let (token, expires_at) = sessions.issue(&user)?;
    tracing::info!(user_id = %user.id, "Admin signed in");
    Ok(LoginResponse {
        token,
        expires_at,
        user,
    })
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    use super::*;

    fn test_secret() -> SecretString {
        let bytes: [u8; 32] = [7; 32];
        SecretString::from(STANDARD.encode(bytes))
    }

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@example.com".into(),
            password_hash: String::new(),
            name: "Admin".into(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn issued_token_validates() {
        let service = SessionTokenService::new(test_secret(), chrono::Duration::hours(1));
        let admin = user(UserRole::Admin);

        let (token, _) = service.issue(&admin).unwrap();
        let session = service.validate(&token).unwrap();
        assert_eq!(session.user_id, admin.id);
        assert!(session.is_admin());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = SessionTokenService::new(test_secret(), chrono::Duration::hours(-1));
        let (token, _) = service.issue(&user(UserRole::Admin)).unwrap();
        assert!(matches!(
            service.validate(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = SessionTokenService::new(test_secret(), chrono::Duration::hours(1));
        let other = SessionTokenService::new(
            SecretString::from(STANDARD.encode([9u8; 32])),
            chrono::Duration::hours(1),
        );
        let (token, _) = issuer.issue(&user(UserRole::Admin)).unwrap();
        assert!(matches!(other.validate(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(other.validate(""), Err(AuthError::MissingToken)));
    }
}
