use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqliteConnection, SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateDependentRequest, Dependent},
    error::{is_unique_violation, AppError, Result},
    repository::DependentRepository,
};

#[derive(FromRow)]
struct DependentRow {
    id: String,
    member_id: String,
    member_number: String,
    name: String,
    relationship: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteDependentRepository {
    pool: SqlitePool,
}

impl SqliteDependentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_dependent(row: DependentRow) -> Result<Dependent> {
        Ok(Dependent {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            member_id: Uuid::parse_str(&row.member_id).map_err(|e| AppError::Database(e.to_string()))?,
            member_number: row.member_number,
            name: row.name,
            relationship: row.relationship,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

/// Inserts one dependent row. Usable inside a caller's transaction.
pub(crate) async fn insert_dependent(
    conn: &mut SqliteConnection,
    member_id: Uuid,
    request: &CreateDependentRequest,
) -> Result<Dependent> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let member_number = request.member_number.trim().to_string();

    sqlx::query(
        r#"
        INSERT INTO dependents (id, member_id, member_number, name, relationship, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#
    )
    .bind(id.to_string())
    .bind(member_id.to_string())
    .bind(&member_number)
    .bind(request.name.trim())
    .bind(&request.relationship)
    .bind(now.naive_utc())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Member number {} already exists", member_number))
        } else {
            AppError::Database(e.to_string())
        }
    })?;

    Ok(Dependent {
        id,
        member_id,
        member_number,
        name: request.name.trim().to_string(),
        relationship: request.relationship.clone(),
        created_at: now,
    })
}

#[async_trait]
impl DependentRepository for SqliteDependentRepository {
    async fn create(&self, member_id: Uuid, request: &CreateDependentRequest) -> Result<Dependent> {
        let mut conn = self.pool.acquire().await?;
        insert_dependent(&mut conn, member_id, request).await
    }

    async fn find_by_member_number(&self, member_number: &str) -> Result<Option<Dependent>> {
        let row = sqlx::query_as::<_, DependentRow>(
            r#"
            SELECT id, member_id, member_number, name, relationship, created_at
            FROM dependents
            WHERE member_number = ?
            "#
        )
        .bind(member_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_dependent).transpose()
    }

    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<Dependent>> {
        let rows = sqlx::query_as::<_, DependentRow>(
            r#"
            SELECT id, member_id, member_number, name, relationship, created_at
            FROM dependents
            WHERE member_id = ?
            ORDER BY member_number ASC
            "#
        )
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_dependent)
            .collect()
    }
}
