use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klub::{
    api,
    config::Settings,
    connect_database,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klub=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Klub server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database and run migrations
    let db_pool = connect_database(&settings.database).await?;

    let service_context = Arc::new(ServiceContext::new(db_pool, &settings));

    // Drop sessions past expiry
    match service_context.auth_service.cleanup_expired_sessions(Utc::now()).await {
        Ok(0) => {}
        Ok(purged) => tracing::info!("Purged {} expired sessions", purged),
        Err(e) => tracing::warn!("Expired session cleanup failed: {:?}", e),
    }

    tracing::info!(
        "Check-in policy: {} points per scan, {}s repeat cooldown",
        settings.checkin.points_per_scan,
        settings.checkin.repeat_scan_cooldown_seconds
    );

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
