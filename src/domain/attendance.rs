use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the attendance ledger. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub member_number: String,
    pub member_name: String,
    pub event_name: String,
    pub scanned_by: String,
    pub scanned_at: DateTime<Utc>,
    pub points_awarded: i64,
    pub status: ScanOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    Granted,
    Denied,
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Granted => "granted",
            ScanOutcome::Denied => "denied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "granted" => Some(ScanOutcome::Granted),
            "denied" => Some(ScanOutcome::Denied),
            _ => None,
        }
    }
}

/// Ledger entry as handed to the repository. Points are derived from the
/// outcome so a denied row can never carry an award.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub member_number: String,
    pub member_name: String,
    pub event_name: String,
    pub scanned_by: String,
    pub scanned_at: DateTime<Utc>,
    pub status: ScanOutcome,
    pub points_awarded: i64,
}

impl NewAttendanceRecord {
    pub fn new(
        member_number: impl Into<String>,
        member_name: impl Into<String>,
        event_name: impl Into<String>,
        scanned_by: impl Into<String>,
        scanned_at: DateTime<Utc>,
        status: ScanOutcome,
        increment: i64,
    ) -> Self {
        let points_awarded = match status {
            ScanOutcome::Granted => increment,
            ScanOutcome::Denied => 0,
        };

        Self {
            member_number: member_number.into(),
            member_name: member_name.into(),
            event_name: event_name.into(),
            scanned_by: scanned_by.into(),
            scanned_at,
            status,
            points_awarded,
        }
    }
}
