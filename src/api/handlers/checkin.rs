use axum::{
    extract::State,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::{AppError, Result},
    service::checkin_service::{ScanRequest, ScanResult},
};

#[derive(Debug, Deserialize)]
pub struct ScanDto {
    pub member_number: Option<String>,
    pub event_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ScanResult,
}

pub async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(dto): Json<ScanDto>,
) -> Result<Json<ScanResponse>> {
    let member_number = dto
        .member_number
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Member number required".to_string()))?;

    let result = state.service_context.checkin_service
        .scan(
            &user.auth,
            ScanRequest { member_number, event_name: dto.event_name },
            Utc::now(),
        )
        .await?;

    Ok(Json(ScanResponse { success: true, result }))
}
