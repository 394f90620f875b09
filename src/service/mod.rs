pub mod checkin_service;
pub mod member_service;
pub mod resolver;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::repository::*;
use checkin_service::CheckinService;
use member_service::MemberService;
use resolver::MembershipResolver;

pub struct ServiceContext {
    pub member_repo: Arc<dyn MemberRepository>,
    pub dependent_repo: Arc<dyn DependentRepository>,
    pub attendance_repo: Arc<dyn AttendanceRepository>,
    pub auth_service: Arc<AuthService>,
    pub member_service: Arc<MemberService>,
    pub checkin_service: Arc<CheckinService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> Self {
        let member_repo: Arc<dyn MemberRepository> =
            Arc::new(SqliteMemberRepository::new(db_pool.clone()));
        let dependent_repo: Arc<dyn DependentRepository> =
            Arc::new(SqliteDependentRepository::new(db_pool.clone()));
        let attendance_repo: Arc<dyn AttendanceRepository> =
            Arc::new(SqliteAttendanceRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_days,
        ));

        let member_service = Arc::new(MemberService::new(
            member_repo.clone(),
            dependent_repo.clone(),
            attendance_repo.clone(),
        ));

        let resolver = Arc::new(MembershipResolver::new(
            member_repo.clone(),
            dependent_repo.clone(),
        ));
        let checkin_service = Arc::new(CheckinService::new(
            resolver,
            attendance_repo.clone(),
            settings.checkin.clone(),
        ));

        Self {
            member_repo,
            dependent_repo,
            attendance_repo,
            auth_service,
            member_service,
            checkin_service,
            db_pool,
        }
    }
}
