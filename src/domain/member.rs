use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::CreateDependentRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub member_number: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_type: String,
    /// Stored verbatim; parsed only when an admission decision is made.
    pub expiry_date: String,
    pub status: MemberStatus,
    pub photo_url: Option<String>,
    pub points: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Membership lifecycle label. Only `active` admits; any other stored label
/// is kept as-is so historical data round-trips untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberStatus {
    Active,
    Other(String),
}

impl MemberStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Other(label) => label.as_str(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MemberStatus::Active)
    }
}

impl From<String> for MemberStatus {
    fn from(label: String) -> Self {
        if label == "active" {
            MemberStatus::Active
        } else {
            MemberStatus::Other(label)
        }
    }
}

impl From<&str> for MemberStatus {
    fn from(label: &str) -> Self {
        MemberStatus::from(label.to_string())
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        match status {
            MemberStatus::Active => "active".to_string(),
            MemberStatus::Other(label) => label,
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 50))]
    pub member_number: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_membership_type")]
    pub membership_type: String,
    #[validate(length(min = 1))]
    pub expiry_date: String,
    #[serde(default = "default_status")]
    pub status: MemberStatus,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    /// Plaintext credential. Defaults to the member's email when absent.
    pub password: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub dependents: Vec<CreateDependentRequest>,
}

impl CreateMemberRequest {
    /// Trims identifying fields so length checks see what will be stored.
    pub fn normalize(&mut self) {
        self.member_number = self.member_number.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.surname = self.surname.trim().to_string();
        self.expiry_date = self.expiry_date.trim().to_string();
        for dependent in &mut self.dependents {
            dependent.normalize();
        }
    }
}

pub fn default_membership_type() -> String {
    "Solo".to_string()
}

fn default_status() -> MemberStatus {
    MemberStatus::Active
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 20))]
    pub status: String,
    pub expiry_date: Option<String>,
}
