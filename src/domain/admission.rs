//! Admission policy: the grant/deny decision for a check-in.
//!
//! The decision is a pure function of the owning member's stored state and
//! the wall clock. It never fails; unreadable expiry data denies.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{Member, ScanOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    Denied(DenialReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Status is anything other than `active`.
    Inactive,
    /// Expiry is at or before the scan time.
    Expired,
    /// The stored expiry could not be parsed.
    UnreadableExpiry,
}

impl Admission {
    pub fn outcome(&self) -> ScanOutcome {
        match self {
            Admission::Granted => ScanOutcome::Granted,
            Admission::Denied(_) => ScanOutcome::Denied,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Admission::Granted => "Access Granted",
            Admission::Denied(DenialReason::Expired) => "Membership Expired",
            Admission::Denied(DenialReason::Inactive) => "Membership Inactive",
            Admission::Denied(DenialReason::UnreadableExpiry) => "Membership Invalid",
        }
    }
}

/// Grants iff the member is `active` and their expiry is strictly after `now`.
pub fn evaluate(member: &Member, now: DateTime<Utc>) -> Admission {
    if !member.status.is_active() {
        return Admission::Denied(DenialReason::Inactive);
    }

    let Some(expiry) = parse_expiry(&member.expiry_date) else {
        tracing::warn!(
            member_number = %member.member_number,
            expiry_date = %member.expiry_date,
            "Unreadable expiry date, denying admission"
        );
        return Admission::Denied(DenialReason::UnreadableExpiry);
    };

    if expiry > now {
        Admission::Granted
    } else {
        Admission::Denied(DenialReason::Expired)
    }
}

/// Parses a stored expiry value. Naive values are taken as UTC; a bare date
/// means midnight at the start of that day.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
