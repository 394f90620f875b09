use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::error::{is_unique_violation, AppError, Result};

pub mod session;

pub use session::{AuthContext, Role, Session, SessionProfile, SessionStore};

/// Attempts at issuing a session before giving up on token collisions.
const MAX_TOKEN_ATTEMPTS: usize = 3;

pub struct AuthService {
    session_store: SessionStore,
    session_duration: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, session_duration_days: i64) -> Self {
        Self {
            session_store: SessionStore::new(pool),
            session_duration: Duration::try_days(session_duration_days).unwrap_or(Duration::MAX),
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    /// Hash a password using Argon2.
    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Issues a bearer token for `email` with the given role snapshot.
    pub async fn issue_session(
        &self,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(Session, String)> {
        let expires_at = now
            .checked_add_signed(self.session_duration)
            .ok_or_else(|| AppError::Internal("Session expiry out of range".to_string()))?;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = generate_token();
            match self.session_store.create(email, &token, role, now, expires_at).await {
                Ok(session) => return Ok((session, token)),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!("Session token collision on attempt {}, retrying", attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal("Could not issue a unique session token".to_string()))
    }

    /// Resolves a bearer token to its session, rejecting unknown or expired
    /// tokens.
    pub async fn authorize(&self, token: &str, now: DateTime<Utc>) -> Result<AuthContext> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        self.session_store
            .find_valid(token, now)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    pub async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.session_store.cleanup_expired(now).await
    }
}

/// Canonical form of a login email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
