use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqliteConnection, SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateMemberRequest, Dependent, Member, MemberStatus},
    error::{is_unique_violation, AppError, Result},
    repository::{dependent_repository::insert_dependent, MemberRepository},
};

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct MemberRow {
    id: String,
    member_number: String,
    first_name: String,
    surname: String,
    email: String,
    phone: Option<String>,
    membership_type: String,
    expiry_date: String,
    status: String,
    photo_url: Option<String>,
    points: i64,
    is_admin: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const MEMBER_COLUMNS: &str = r#"
    id, member_number, first_name, surname, email, phone, membership_type,
    expiry_date, status, photo_url, points, is_admin, created_at, updated_at
"#;

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_member(row: MemberRow) -> Result<Member> {
        Ok(Member {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            member_number: row.member_number,
            first_name: row.first_name,
            surname: row.surname,
            email: row.email,
            phone: row.phone,
            membership_type: row.membership_type,
            expiry_date: row.expiry_date,
            status: MemberStatus::from(row.status),
            photo_url: row.photo_url,
            points: row.points,
            is_admin: row.is_admin != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Member>> {
        let query = format!("SELECT {} FROM members WHERE {} = ?", MEMBER_COLUMNS, column);
        let row = sqlx::query_as::<_, MemberRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_member(r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_existing(&self, id: Uuid) -> Result<Member> {
        self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }
}

async fn insert_member(
    conn: &mut SqliteConnection,
    id: Uuid,
    request: &CreateMemberRequest,
    password_hash: &str,
) -> Result<()> {
    let now = Utc::now().naive_utc();
    let photo_url = request.photo_url.clone().unwrap_or_else(|| {
        format!(
            "https://ui-avatars.com/api/?name={}+{}",
            request.first_name.trim(),
            request.surname.trim()
        )
    });

    sqlx::query(
        r#"
        INSERT INTO members (
            id, member_number, first_name, surname, email, phone, password_hash,
            membership_type, expiry_date, status, photo_url, points, is_admin,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
        "#
    )
    .bind(id.to_string())
    .bind(request.member_number.trim())
    .bind(request.first_name.trim())
    .bind(request.surname.trim())
    .bind(&request.email)
    .bind(&request.phone)
    .bind(password_hash)
    .bind(&request.membership_type)
    .bind(request.expiry_date.trim())
    .bind(request.status.as_str())
    .bind(&photo_url)
    .bind(if request.is_admin { 1i32 } else { 0i32 })
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email or member number already exists".to_string())
        } else {
            AppError::Database(e.to_string())
        }
    })?;

    Ok(())
}

/// Single-statement increment so concurrent credits never lose updates.
/// Usable inside a caller's transaction.
pub(crate) async fn increment_points(
    conn: &mut SqliteConnection,
    member_id: Uuid,
    amount: i64,
) -> Result<i64> {
    if amount < 0 {
        return Err(AppError::BadRequest("Point credit cannot be negative".to_string()));
    }

    let balance = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE members
        SET points = points + ?, updated_at = ?
        WHERE id = ?
        RETURNING points
        "#
    )
    .bind(amount)
    .bind(Utc::now().naive_utc())
    .bind(member_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    balance.ok_or_else(|| AppError::NotFound("Member not found".to_string()))
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, request: &CreateMemberRequest, password_hash: &str) -> Result<(Member, Vec<Dependent>)> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        insert_member(&mut tx, id, request, password_hash).await?;

        let mut dependents = Vec::with_capacity(request.dependents.len());
        for dependent in &request.dependents {
            dependents.push(insert_dependent(&mut tx, id, dependent).await?);
        }

        tx.commit().await?;

        let member = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created member".to_string())
        })?;

        Ok((member, dependents))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.find_one("email", email).await
    }

    async fn find_by_member_number(&self, member_number: &str) -> Result<Option<Member>> {
        self.find_one("member_number", member_number).await
    }

    async fn get_password_hash(&self, email: &str) -> Result<Option<String>> {
        let result = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM members WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn update_status(&self, id: Uuid, status: &MemberStatus, expiry_date: Option<&str>) -> Result<Member> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET status = ?,
                expiry_date = COALESCE(?, expiry_date),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(status.as_str())
        .bind(expiry_date)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.fetch_existing(id).await
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<Member> {
        let result = sqlx::query("UPDATE members SET is_admin = ?, updated_at = ? WHERE id = ?")
            .bind(if is_admin { 1i32 } else { 0i32 })
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.fetch_existing(id).await
    }

    async fn credit_points(&self, id: Uuid, amount: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        increment_points(&mut conn, id, amount).await
    }

    async fn is_member_number_taken(&self, member_number: &str) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM members WHERE member_number = ?
                UNION ALL
                SELECT 1 FROM dependents WHERE member_number = ?
            )
            "#
        )
        .bind(member_number)
        .bind(member_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken != 0)
    }
}
