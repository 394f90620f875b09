use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Role captured when the session was issued. Never re-derived from the
/// member record afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn for_admin_flag(is_admin: bool) -> Self {
        if is_admin { Role::Admin } else { Role::Member }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(AppError::Database(format!("Invalid session role: {}", s))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub token_hash: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Display projection of the session owner's member record. Absent fields
/// mean the member row no longer matches the session email.
#[derive(Debug, Clone, Serialize)]
pub struct SessionProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub member_number: Option<String>,
    pub is_admin: Option<bool>,
}

/// Result of a successful token check.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub profile: SessionProfile,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(FromRow)]
struct AuthRow {
    id: String,
    email: String,
    role: String,
    expires_at: NaiveDateTime,
    first_name: Option<String>,
    surname: Option<String>,
    member_number: Option<String>,
    is_admin: Option<i32>,
}

pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a session row. A duplicate token hash surfaces as the raw
    /// sqlx error so the caller can retry with a fresh token.
    pub async fn create(
        &self,
        email: &str,
        token: &str,
        role: Role,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> std::result::Result<Session, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let token_hash = hash_token(token);

        sqlx::query(
            r#"
            INSERT INTO sessions (id, email, token_hash, role, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(email)
        .bind(&token_hash)
        .bind(role.as_str())
        .bind(now.naive_utc())
        .bind(expires_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(Session {
            id,
            email: email.to_string(),
            token_hash,
            role,
            expires_at,
            created_at: now,
        })
    }

    /// Looks up a token that is still valid at `now` (expiry is exclusive).
    pub async fn find_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<AuthContext>> {
        let token_hash = hash_token(token);

        let row = sqlx::query_as::<_, AuthRow>(
            r#"
            SELECT s.id, s.email, s.role, s.expires_at,
                   m.first_name, m.surname, m.member_number, m.is_admin
            FROM sessions s
            LEFT JOIN members m ON m.email = s.email
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#
        )
        .bind(&token_hash)
        .bind(now.naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(AuthContext {
                session_id: row.id,
                role: Role::parse(&row.role)?,
                expires_at: DateTime::from_naive_utc_and_offset(row.expires_at, Utc),
                profile: SessionProfile {
                    email: row.email.clone(),
                    first_name: row.first_name,
                    surname: row.surname,
                    member_number: row.member_number,
                    is_admin: row.is_admin.map(|flag| flag != 0),
                },
                email: row.email,
            })),
            None => Ok(None),
        }
    }

    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

pub(crate) fn hash_token(token: &str) -> String {
    use sha2::{Sha256, Digest};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
