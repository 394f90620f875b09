pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::root::health_check))
        .route("/api/test", get(handlers::root::api_test))

        // Auth routes
        .route("/api/login", post(handlers::auth::login))

        // Check-in (admin scanners)
        .nest("/api/scan", scan_routes(app_state.clone()))

        // Member self-service
        .nest("/api/member", member_routes(app_state.clone()))

        // Admin routes
        .nest("/api/admin", admin_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn scan_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::checkin::scan))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}

fn member_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::member::profile))
        .route("/qr", get(handlers::member::qr_code))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/members", post(handlers::admin::create_member))
        .route("/members/:member_number/status", put(handlers::admin::update_status))
        .route("/members/:member_number/dependents", post(handlers::admin::add_dependent))
        .route("/attendance", get(handlers::admin::attendance_log))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
