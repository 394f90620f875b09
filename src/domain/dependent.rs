use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A family member attached to a primary member. Check-in capable, but has
/// no credential or points balance of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependent {
    pub id: Uuid,
    pub member_id: Uuid,
    pub member_number: String,
    pub name: String,
    pub relationship: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDependentRequest {
    #[validate(length(min = 1, max = 50))]
    pub member_number: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    pub relationship: Option<String>,
}

impl CreateDependentRequest {
    pub fn normalize(&mut self) {
        self.member_number = self.member_number.trim().to_string();
        self.name = self.name.trim().to_string();
    }
}
