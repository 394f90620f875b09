use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    auth::Role,
    domain::{Member, MemberStatus},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub role: Role,
    pub member: MemberSummary,
}

#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub member_number: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub membership_type: String,
    pub status: MemberStatus,
    pub points: i64,
    pub is_admin: bool,
}

impl From<Member> for MemberSummary {
    fn from(member: Member) -> Self {
        Self {
            member_number: member.member_number,
            first_name: member.first_name,
            surname: member.surname,
            email: member.email,
            membership_type: member.membership_type,
            status: member.status,
            points: member.points,
            is_admin: member.is_admin,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Email and password required".to_string()));
    }

    let member = state.service_context.member_service
        .authenticate(&req.email, &req.password)
        .await?;

    // Role is fixed for the life of the session
    let role = Role::for_admin_flag(member.is_admin);

    let (_session, token) = state.service_context.auth_service
        .issue_session(&member.email, role, Utc::now())
        .await?;

    tracing::info!(email = %member.email, role = role.as_str(), "Login successful");

    Ok(Json(LoginResponse {
        success: true,
        token,
        role,
        member: member.into(),
    }))
}
