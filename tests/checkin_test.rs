mod common;

use chrono::{Duration, Utc};
use klub::{
    auth::Role,
    config::Settings,
    domain::{MemberStatus, NewAttendanceRecord, ScanOutcome},
    error::AppError,
    service::checkin_service::ScanRequest,
};

use common::*;
use uuid::Uuid;

fn scan_of(code: &str) -> ScanRequest {
    ScanRequest {
        member_number: code.to_string(),
        event_name: Some("Spring Gala".to_string()),
    }
}

#[tokio::test]
async fn test_active_member_is_granted_and_credited() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("M0001"), scan_time())
        .await?;

    assert_eq!(result.status, ScanOutcome::Granted);
    assert_eq!(result.points_awarded, 10);
    assert_eq!(result.points_balance, Some(10));
    assert_eq!(result.member_name, "Jo M0001");
    assert_eq!(result.message, "Access Granted");

    let member = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(member.points, 10);

    let ledger = services.attendance_repo.recent(10).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, ScanOutcome::Granted);
    assert_eq!(ledger[0].points_awarded, 10);
    assert_eq!(ledger[0].event_name, "Spring Gala");
    assert_eq!(ledger[0].scanned_by, "door@club.org");

    Ok(())
}

#[tokio::test]
async fn test_expired_member_is_denied_and_recorded() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0002", "m2@club.org", "2020-01-01")).await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("M0002"), scan_time())
        .await?;

    assert_eq!(result.status, ScanOutcome::Denied);
    assert_eq!(result.points_awarded, 0);
    assert_eq!(result.message, "Membership Expired");

    let member = services.member_repo.find_by_member_number("M0002").await?.unwrap();
    assert_eq!(member.points, 0);

    let ledger = services.attendance_repo.recent(10).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, ScanOutcome::Denied);
    assert_eq!(ledger[0].points_awarded, 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_code_is_not_found_without_ledger_row() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("ZZZZ"), scan_time())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(services.attendance_repo.recent(10).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_dependent_scan_credits_owner() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    let mut request = member_request("M0001", "m1@club.org", "2027-12-31");
    request.dependents.push(dependent_request("M0001-A", "Kit Jo"));
    add_member(&services, request).await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("M0001-A"), scan_time())
        .await?;

    assert_eq!(result.status, ScanOutcome::Granted);
    assert_eq!(result.member_name, "Kit Jo");
    assert_eq!(result.member_number, "M0001-A");

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, 10);

    let ledger = services.attendance_repo.recent(10).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].member_number, "M0001-A");
    assert_eq!(ledger[0].member_name, "Kit Jo");

    Ok(())
}

#[tokio::test]
async fn test_dependent_of_inactive_owner_is_denied() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    let mut request = member_request("M0003", "m3@club.org", "2027-12-31");
    request.status = MemberStatus::from("suspended");
    request.dependents.push(dependent_request("M0003-A", "Ari"));
    add_member(&services, request).await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("M0003-A"), scan_time())
        .await?;

    assert_eq!(result.status, ScanOutcome::Denied);
    assert_eq!(result.message, "Membership Inactive");
    let owner = services.member_repo.find_by_member_number("M0003").await?.unwrap();
    assert_eq!(owner.points, 0);

    Ok(())
}

#[tokio::test]
async fn test_scan_at_exact_expiry_is_denied() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    let expiry = scan_time().to_rfc3339();
    add_member(&services, member_request("M0004", "m4@club.org", &expiry)).await?;

    let at_expiry = services.checkin_service
        .scan(&admin(), scan_of("M0004"), scan_time())
        .await?;
    assert_eq!(at_expiry.status, ScanOutcome::Denied);

    let before = services.checkin_service
        .scan(&admin(), scan_of("M0004"), scan_time() - Duration::seconds(1))
        .await?;
    assert_eq!(before.status, ScanOutcome::Granted);

    Ok(())
}

#[tokio::test]
async fn test_non_admin_cannot_scan() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let result = services.checkin_service
        .scan(&actor("m1@club.org", Role::Member), scan_of("M0001"), scan_time())
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
    assert!(services.attendance_repo.recent(10).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_blank_code_is_rejected_and_event_defaults() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let blank = services.checkin_service
        .scan(&admin(), scan_of("   "), scan_time())
        .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    services.checkin_service
        .scan(
            &admin(),
            ScanRequest { member_number: " M0001 ".to_string(), event_name: Some("  ".to_string()) },
            scan_time(),
        )
        .await?;

    let ledger = services.attendance_repo.recent(10).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].member_number, "M0001");
    assert_eq!(ledger[0].event_name, "General Access");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_never_lose_points() -> anyhow::Result<()> {
    const SCANS: i64 = 20;

    let services = setup_services(&Settings::default()).await?;
    let mut request = member_request("M0001", "m1@club.org", "2027-12-31");
    request.dependents.push(dependent_request("M0001-A", "Kit Jo"));
    add_member(&services, request).await?;

    let mut handles = Vec::new();
    for i in 0..SCANS {
        let services = services.clone();
        // Alternate between the member's own code and the dependent's
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
    }

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, SCANS * 10);

    let own = services.attendance_repo.count_for_member_number("M0001", ScanOutcome::Granted).await?;
    let dependent = services.attendance_repo.count_for_member_number("M0001-A", ScanOutcome::Granted).await?;
    assert_eq!(own + dependent, SCANS);

    Ok(())
}

#[tokio::test]
async fn test_repeat_scan_inside_cooldown_awards_nothing() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.checkin.repeat_scan_cooldown_seconds = 300;
    let services = setup_services(&settings).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    let first = services.checkin_service
        .scan(&admin(), scan_of("M0001"), scan_time())
        .await?;
    assert_eq!(first.points_awarded, 10);

    let repeat = services.checkin_service
        .scan(&admin(), scan_of("M0001"), scan_time() + Duration::seconds(30))
        .await?;
    assert_eq!(repeat.status, ScanOutcome::Granted);
    assert_eq!(repeat.points_awarded, 0);
    assert_eq!(repeat.message, "Already checked in");
    assert!(repeat.record_id.is_none());

    let later = services.checkin_service
        .scan(&admin(), scan_of("M0001"), scan_time() + Duration::seconds(301))
        .await?;
    assert_eq!(later.points_awarded, 10);

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, 20);
    assert_eq!(services.attendance_repo.recent(10).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_repeat_scans_all_award_without_cooldown() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;

    for i in 0..3 {
        let result = services.checkin_service
            .scan(&admin(), scan_of("M0001"), scan_time() + Duration::seconds(i))
            .await?;
        assert_eq!(result.points_awarded, 10);
    }

    let owner = services.member_repo.find_by_member_number("M0001").await?.unwrap();
    assert_eq!(owner.points, 30);

    Ok(())
}

#[tokio::test]
async fn test_failed_credit_leaves_no_ledger_row() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;

    let entry = NewAttendanceRecord::new(
        "M0404",
        "Nobody",
        "General Access",
        "door@club.org",
        scan_time(),
        ScanOutcome::Granted,
        10,
    );
    let result = services.attendance_repo
        .record_granted(entry, Uuid::new_v4(), None)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(services.attendance_repo.recent(10).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_primary_number_wins_over_colliding_dependent() -> anyhow::Result<()> {
    let services = setup_services(&Settings::default()).await?;
    let (primary, _) = add_member(&services, member_request("M0001", "m1@club.org", "2027-12-31")).await?;
    let (other, _) = add_member(&services, member_request("M0002", "m2@club.org", "2027-12-31")).await?;

    // The service refuses this, so plant it directly
    sqlx::query(
        "INSERT INTO dependents (id, member_id, member_number, name, relationship, created_at) VALUES (?, ?, ?, ?, NULL, ?)"
    )
    .bind(Uuid::new_v4().to_string())
    .bind(other.id.to_string())
    .bind("M0001")
    .bind("Shadow")
    .bind(Utc::now().naive_utc())
    .execute(&services.db_pool)
    .await?;

    let result = services.checkin_service
        .scan(&admin(), scan_of("M0001"), scan_time())
        .await?;
    assert_eq!(result.member_name, "Jo M0001");

    let primary = services.member_repo.find_by_id(primary.id).await?.unwrap();
    let other = services.member_repo.find_by_id(other.id).await?.unwrap();
    assert_eq!(primary.points, 10);
    assert_eq!(other.points, 0);

    Ok(())
}
