mod common;

use std::sync::Arc;

use klub::{
    config::{DatabaseConfig, Settings},
    connect_database,
    domain::ScanOutcome,
    service::{checkin_service::ScanRequest, ServiceContext},
};
use tempfile::TempDir;

use common::*;

/// File-backed database with several pooled connections, so scans really
/// run side by side.
async fn setup_file_services(settings: &Settings) -> anyhow::Result<(TempDir, Arc<ServiceContext>)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("klub.db");

    let database = DatabaseConfig {
        url: format!("sqlite://{}", path.display()),
        max_connections: 8,
    };
    let pool = connect_database(&database).await?;

    Ok((temp_dir, Arc::new(ServiceContext::new(pool, settings))))
}

fn scan_of(code: &str) -> ScanRequest {
    ScanRequest {
        member_number: code.to_string(),
        event_name: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_grants_on_shared_database() -> anyhow::Result<()> {
    const SCANS: i64 = 40;

    let (_dir, services) = setup_file_services(&Settings::default()).await?;
    let mut request = member_request("M0001", "m1@club.org", "2027-12-31");
    request.dependents.push(dependent_request("M0001-A", "Kit Jo"));
    add_member(&services, request).await?;

    let mut handles = Vec::new();
    for i in 0..SCANS {
        let services = services.clone();
        let code = if i % 2 == 0 { "M0001" } else { "M0001-A" };
        handles.push(tokio::spawn(async move {
            services.checkin_service
                .scan(&admin(), scan_of(code), scan_time())
                .await
        }));
    }

    for handle in handles {
        let result = handle.await??;
        assert_eq!(result.status, ScanOutcome::Granted);
        assert_eq!(result.points_awarded, 10);
    }

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, SCANS * 10);

    let own = services.attendance_repo.count_for_member_number("M0001", ScanOutcome::Granted).await?;
    let dependent = services.attendance_repo.count_for_member_number("M0001-A", ScanOutcome::Granted).await?;
    assert_eq!(own + dependent, SCANS);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_double_taps_award_once_inside_cooldown() -> anyhow::Result<()> {
    const TAPS: usize = 10;

    let mut settings = Settings::default();
    settings.checkin.repeat_scan_cooldown_seconds = 60;
    let (_dir, services) = setup_file_services(&settings).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let mut handles = Vec::new();
    for _ in 0..TAPS {
        let services = services.clone();
        handles.push(tokio::spawn(async move {
            services.checkin_service
                .scan(&admin(), scan_of("M0001"), scan_time())
                .await
        }));
    }

    let mut awarded = 0;
    for handle in handles {
        let result = handle.await??;
        assert_eq!(result.status, ScanOutcome::Granted);
        if result.points_awarded > 0 {
            awarded += 1;
        }
    }
    assert_eq!(awarded, 1);

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, 10);
    assert_eq!(
        services.attendance_repo.count_for_member_number("M0001", ScanOutcome::Granted).await?,
        1
    );

    Ok(())
}
