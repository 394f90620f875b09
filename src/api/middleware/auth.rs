use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::{
    api::state::AppState,
    auth::AuthContext,
    error::AppError,
};

#[derive(Clone)]
pub struct CurrentUser {
    pub auth: AuthContext,
}

/// Pulls the session token from `Authorization`, accepting either
/// `Bearer <token>` or the bare token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() { None } else { Some(token) }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;

    state.service_context.auth_service
        .authorize(token, Utc::now())
        .await
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = authenticate(&state, request.headers()).await?;

    // Insert current user into request extensions
    request.extensions_mut().insert(CurrentUser { auth });

    Ok(next.run(request).await)
}

/// Admin gate. Uses the role captured at login, not the member's current
/// admin flag. Non-admins get 401 like any other rejected token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = authenticate(&state, request.headers()).await?;

    if !auth.is_admin() {
        tracing::info!(email = %auth.email, path = %request.uri().path(), "Admin route refused");
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentUser { auth });

    Ok(next.run(request).await)
}
