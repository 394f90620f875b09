use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    domain::{
        AttendanceRecord, CreateDependentRequest, CreateMemberRequest, Dependent, Member,
        UpdateStatusRequest,
    },
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct ProvisionedMember {
    pub member: Member,
    pub family_members: Vec<Dependent>,
}

pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<ProvisionedMember>)> {
    let (member, family_members) = state.service_context.member_service
        .provision_member(request)
        .await?;

    Ok((StatusCode::CREATED, Json(ProvisionedMember { member, family_members })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(member_number): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Member>> {
    let member = state.service_context.member_service
        .update_status(&member_number, request)
        .await?;

    Ok(Json(member))
}

pub async fn add_dependent(
    State(state): State<AppState>,
    Path(member_number): Path<String>,
    Json(request): Json<CreateDependentRequest>,
) -> Result<(StatusCode, Json<Dependent>)> {
    let dependent = state.service_context.member_service
        .add_dependent(&member_number, request)
        .await?;

    Ok((StatusCode::CREATED, Json(dependent)))
}

#[derive(Debug, Deserialize)]
pub struct LedgerParams {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

const MAX_LEDGER_PAGE: i64 = 500;

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    attendance: Vec<AttendanceRecord>,
    total: usize,
}

pub async fn attendance_log(
    State(state): State<AppState>,
    Query(params): Query<LedgerParams>,
) -> Result<Json<LedgerResponse>> {
    let limit = params.limit.clamp(1, MAX_LEDGER_PAGE);
    let attendance = state.service_context.attendance_repo
        .recent(limit)
        .await?;

    let total = attendance.len();
    Ok(Json(LedgerResponse { attendance, total }))
}
