use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod member_repository;
pub mod dependent_repository;
pub mod attendance_repository;

pub use member_repository::SqliteMemberRepository;
pub use dependent_repository::SqliteDependentRepository;
pub use attendance_repository::SqliteAttendanceRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Inserts a member and `request.dependents` in one transaction.
    /// `request.email` must already be normalized.
    async fn create(&self, request: &CreateMemberRequest, password_hash: &str) -> Result<(Member, Vec<Dependent>)>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;
    async fn find_by_member_number(&self, member_number: &str) -> Result<Option<Member>>;
    async fn get_password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn update_status(&self, id: Uuid, status: &MemberStatus, expiry_date: Option<&str>) -> Result<Member>;
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<Member>;
    /// Atomically adds `amount` to the member's balance, returning the new balance.
    async fn credit_points(&self, id: Uuid, amount: i64) -> Result<i64>;
    /// True if the number is used by any member or dependent.
    async fn is_member_number_taken(&self, member_number: &str) -> Result<bool>;
}

#[async_trait]
pub trait DependentRepository: Send + Sync {
    async fn create(&self, member_id: Uuid, request: &CreateDependentRequest) -> Result<Dependent>;
    async fn find_by_member_number(&self, member_number: &str) -> Result<Option<Dependent>>;
    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<Dependent>>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Appends a ledger row with no balance side effect.
    async fn record(&self, entry: NewAttendanceRecord) -> Result<AttendanceRecord>;
    /// Appends a granted row and credits its points to `owner_id` in one
    /// transaction. When `cooldown_since` is set and the same code already
    /// has a granted row after it, nothing is written and `None` is returned.
    async fn record_granted(
        &self,
        entry: NewAttendanceRecord,
        owner_id: Uuid,
        cooldown_since: Option<DateTime<Utc>>,
    ) -> Result<Option<(AttendanceRecord, i64)>>;
    /// Rows scanned under the member's own number or any of their
    /// dependents' numbers, newest first.
    async fn history_for_member(&self, member_id: Uuid, member_number: &str, limit: i64) -> Result<Vec<AttendanceRecord>>;
    async fn recent(&self, limit: i64) -> Result<Vec<AttendanceRecord>>;
    async fn count_for_member_number(&self, member_number: &str, status: ScanOutcome) -> Result<i64>;
}
