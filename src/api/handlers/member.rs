use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use qrcode::{render::svg, QrCode};
use serde::Deserialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::{AppError, Result},
    service::member_service::MemberProfile,
};

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MemberProfile>> {
    let profile = state.service_context.member_service
        .profile(&user.auth.email)
        .await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct QrParams {
    pub member_number: Option<String>,
}

/// SVG QR code for the caller's own number or one of their dependents'.
pub async fn qr_code(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<QrParams>,
) -> Result<impl IntoResponse> {
    let profile = state.service_context.member_service
        .profile(&user.auth.email)
        .await?;

    let number = match params.member_number.as_deref().map(str::trim) {
        None | Some("") => profile.member.member_number.clone(),
        Some(requested) if requested == profile.member.member_number => requested.to_string(),
        Some(requested) => profile
            .family_members
            .iter()
            .find(|d| d.member_number == requested)
            .map(|d| d.member_number.clone())
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?,
    };

    let svg = render_qr_svg(&number)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

pub fn render_qr_svg(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR encoding failed: {}", e)))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .quiet_zone(true)
        .build())
}
