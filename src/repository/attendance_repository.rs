use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqliteConnection, SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, NewAttendanceRecord, ScanOutcome},
    error::{AppError, Result},
    repository::{member_repository::increment_points, AttendanceRepository},
};

#[derive(FromRow)]
struct AttendanceRow {
    id: String,
    member_number: String,
    member_name: String,
    event_name: String,
    scanned_by: String,
    scanned_at: NaiveDateTime,
    points_awarded: i64,
    status: String,
}

pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
}

impl SqliteAttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: AttendanceRow) -> Result<AttendanceRecord> {
        let status = ScanOutcome::parse(&row.status)
            .ok_or_else(|| AppError::Database(format!("Invalid attendance status: {}", row.status)))?;

        Ok(AttendanceRecord {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            member_number: row.member_number,
            member_name: row.member_name,
            event_name: row.event_name,
            scanned_by: row.scanned_by,
            scanned_at: DateTime::from_naive_utc_and_offset(row.scanned_at, Utc),
            points_awarded: row.points_awarded,
            status,
        })
    }

    fn entry_to_record(id: Uuid, entry: NewAttendanceRecord) -> AttendanceRecord {
        AttendanceRecord {
            id,
            member_number: entry.member_number,
            member_name: entry.member_name,
            event_name: entry.event_name,
            scanned_by: entry.scanned_by,
            scanned_at: entry.scanned_at,
            points_awarded: entry.points_awarded,
            status: entry.status,
        }
    }
}

/// Appends a ledger row unless the same code already has a granted row
/// after `not_granted_since`. A `None` cutoff always inserts. The check and
/// the insert are one statement. Returns whether a row was written.
async fn insert_record(
    conn: &mut SqliteConnection,
    id: Uuid,
    entry: &NewAttendanceRecord,
    not_granted_since: Option<DateTime<Utc>>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (
            id, member_number, member_name, event_name, scanned_by,
            scanned_at, points_awarded, status
        )
        SELECT ?, ?, ?, ?, ?, ?, ?, ?
        WHERE NOT EXISTS (
            SELECT 1 FROM attendance
            WHERE member_number = ? AND status = 'granted' AND scanned_at > ?
        )
        "#
    )
    .bind(id.to_string())
    .bind(&entry.member_number)
    .bind(&entry.member_name)
    .bind(&entry.event_name)
    .bind(&entry.scanned_by)
    .bind(entry.scanned_at.naive_utc())
    .bind(entry.points_awarded)
    .bind(entry.status.as_str())
    .bind(&entry.member_number)
    .bind(not_granted_since.map(|dt| dt.naive_utc()))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl AttendanceRepository for SqliteAttendanceRepository {
    async fn record(&self, entry: NewAttendanceRecord) -> Result<AttendanceRecord> {
        let id = Uuid::new_v4();
        let mut conn = self.pool.acquire().await?;

        if !insert_record(&mut conn, id, &entry, None).await? {
            return Err(AppError::Database("Attendance row was not written".to_string()));
        }

        Ok(Self::entry_to_record(id, entry))
    }

    async fn record_granted(
        &self,
        entry: NewAttendanceRecord,
        owner_id: Uuid,
        cooldown_since: Option<DateTime<Utc>>,
    ) -> Result<Option<(AttendanceRecord, i64)>> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        if !insert_record(&mut tx, id, &entry, cooldown_since).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let balance = increment_points(&mut tx, owner_id, entry.points_awarded).await?;
        tx.commit().await?;

        Ok(Some((Self::entry_to_record(id, entry), balance)))
    }

    async fn history_for_member(&self, member_id: Uuid, member_number: &str, limit: i64) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, member_number, member_name, event_name, scanned_by,
                   scanned_at, points_awarded, status
            FROM attendance
            WHERE member_number = ? OR member_number IN (
                SELECT member_number FROM dependents WHERE member_id = ?
            )
            ORDER BY scanned_at DESC
            LIMIT ?
            "#
        )
        .bind(member_number)
        .bind(member_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_record)
            .collect()
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, member_number, member_name, event_name, scanned_by,
                   scanned_at, points_awarded, status
            FROM attendance
            ORDER BY scanned_at DESC
            LIMIT ?
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_record)
            .collect()
    }

    async fn count_for_member_number(&self, member_number: &str, status: ScanOutcome) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE member_number = ? AND status = ?"
        )
        .bind(member_number)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
