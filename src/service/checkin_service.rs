use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AuthContext,
    config::CheckinConfig,
    domain::{evaluate, Admission, NewAttendanceRecord, ScanOutcome},
    error::{AppError, Result},
    repository::AttendanceRepository,
};
use super::resolver::MembershipResolver;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub member_number: String,
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub status: ScanOutcome,
    pub member_name: String,
    pub member_number: String,
    pub points_awarded: i64,
    pub message: String,
    /// Owner's balance after this scan; `None` when nothing was credited.
    pub points_balance: Option<i64>,
    /// Ledger row written for this scan; `None` for a suppressed repeat.
    pub record_id: Option<Uuid>,
}

pub struct CheckinService {
    resolver: Arc<MembershipResolver>,
    attendance_repo: Arc<dyn AttendanceRepository>,
    config: CheckinConfig,
}

impl CheckinService {
    pub fn new(
        resolver: Arc<MembershipResolver>,
        attendance_repo: Arc<dyn AttendanceRepository>,
        config: CheckinConfig,
    ) -> Self {
        Self { resolver, attendance_repo, config }
    }

    /// Runs one scan end to end: resolve, decide, record, credit.
    ///
    /// Unresolved codes fail with `NotFound` and leave no ledger row. Every
    /// resolved scan is recorded, granted or denied. A granted scan's row
    /// and its credit commit together.
    pub async fn scan(
        &self,
        actor: &AuthContext,
        request: ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<ScanResult> {
        if !actor.is_admin() {
            return Err(AppError::Unauthorized);
        }

        let code = request.member_number.trim();
        if code.is_empty() {
            return Err(AppError::BadRequest("Member number required".to_string()));
        }

        let event_name = request
            .event_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.config.default_event_name.as_str())
            .to_string();

        let resolved = match self.resolver.resolve(code).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if matches!(e, AppError::NotFound(_)) {
                    tracing::info!(member_number = %code, scanned_by = %actor.email, "Scan did not resolve");
                }
                return Err(e);
            }
        };

        let admission = evaluate(&resolved.owner, now);
        let entry = NewAttendanceRecord::new(
            resolved.member_number.clone(),
            resolved.display_name.clone(),
            event_name.clone(),
            actor.email.clone(),
            now,
            admission.outcome(),
            self.config.points_per_scan,
        );

        let result = match admission {
            Admission::Granted => {
                let cooldown_since = (self.config.repeat_scan_cooldown_seconds > 0)
                    .then(|| cooldown_cutoff(now, self.config.repeat_scan_cooldown_seconds));

                match self.attendance_repo
                    .record_granted(entry, resolved.owner.id, cooldown_since)
                    .await?
                {
                    Some((record, balance)) => ScanResult {
                        status: ScanOutcome::Granted,
                        member_name: resolved.display_name,
                        member_number: resolved.member_number,
                        points_awarded: record.points_awarded,
                        message: admission.message().to_string(),
                        points_balance: Some(balance),
                        record_id: Some(record.id),
                    },
                    None => {
                        tracing::info!(member_number = %code, "Repeat scan inside cooldown, no points awarded");
                        ScanResult {
                            status: ScanOutcome::Granted,
                            member_name: resolved.display_name,
                            member_number: resolved.member_number,
                            points_awarded: 0,
                            message: "Already checked in".to_string(),
                            points_balance: None,
                            record_id: None,
                        }
                    }
                }
            }
            Admission::Denied(_) => {
                let record = self.attendance_repo.record(entry).await?;
                ScanResult {
                    status: ScanOutcome::Denied,
                    member_name: resolved.display_name,
                    member_number: resolved.member_number,
                    points_awarded: 0,
                    message: admission.message().to_string(),
                    points_balance: None,
                    record_id: Some(record.id),
                }
            }
        };

        tracing::info!(
            member_number = %result.member_number,
            owner = %resolved.owner.member_number,
            via_dependent = resolved.via_dependent,
            event = %event_name,
            status = result.status.as_str(),
            points = result.points_awarded,
            scanned_by = %actor.email,
            "Check-in processed"
        );

        Ok(result)
    }
}

/// Start of the repeat-scan window. Saturates at the earliest representable
/// instant.
fn cooldown_cutoff(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
