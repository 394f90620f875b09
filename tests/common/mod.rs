#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use klub::{
    auth::{AuthContext, Role, SessionProfile},
    config::Settings,
    domain::{CreateDependentRequest, CreateMemberRequest, Dependent, Member, MemberStatus},
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// In-memory database with migrations applied. A single connection keeps
/// every query on the same in-memory database.
pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

pub async fn setup_services(settings: &Settings) -> anyhow::Result<Arc<ServiceContext>> {
    let pool = setup_pool().await?;
    Ok(Arc::new(ServiceContext::new(pool, settings)))
}

/// Fixed scan clock: 2026-10-17 12:00 UTC.
pub fn scan_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

pub fn member_request(member_number: &str, email: &str, expiry_date: &str) -> CreateMemberRequest {
    CreateMemberRequest {
        member_number: member_number.to_string(),
        first_name: "Jo".to_string(),
        surname: member_number.to_string(),
        email: email.to_string(),
        phone: None,
        membership_type: "Solo".to_string(),
        expiry_date: expiry_date.to_string(),
        status: MemberStatus::Active,
        photo_url: None,
        is_admin: false,
        password: None,
        dependents: Vec::new(),
    }
}

pub fn dependent_request(member_number: &str, name: &str) -> CreateDependentRequest {
    CreateDependentRequest {
        member_number: member_number.to_string(),
        name: name.to_string(),
        relationship: Some("Child".to_string()),
    }
}

pub async fn add_member(
    services: &ServiceContext,
    request: CreateMemberRequest,
) -> anyhow::Result<(Member, Vec<Dependent>)> {
    Ok(services.member_service.provision_member(request).await?)
}

pub fn actor(email: &str, role: Role) -> AuthContext {
    AuthContext {
        session_id: "test-session".to_string(),
        email: email.to_string(),
        role,
        expires_at: scan_time() + Duration::days(30),
        profile: SessionProfile {
            email: email.to_string(),
            first_name: None,
            surname: None,
            member_number: None,
            is_admin: Some(role == Role::Admin),
        },
    }
}

pub fn admin() -> AuthContext {
    actor("door@club.org", Role::Admin)
}
