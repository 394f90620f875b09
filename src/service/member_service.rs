use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::{
    auth::{normalize_email, AuthService},
    domain::*,
    error::{AppError, Result},
    repository::{AttendanceRepository, DependentRepository, MemberRepository},
};

/// Attendance rows shown on a member's own profile.
pub const PROFILE_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub member: Member,
    pub family_members: Vec<Dependent>,
    pub attendance: Vec<AttendanceRecord>,
}

pub struct MemberService {
    member_repo: Arc<dyn MemberRepository>,
    dependent_repo: Arc<dyn DependentRepository>,
    attendance_repo: Arc<dyn AttendanceRepository>,
}

impl MemberService {
    pub fn new(
        member_repo: Arc<dyn MemberRepository>,
        dependent_repo: Arc<dyn DependentRepository>,
        attendance_repo: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self { member_repo, dependent_repo, attendance_repo }
    }

    /// Checks an email/password pair. Email is case-insensitive; the
    /// password is compared exactly.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Member> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest("Email and password required".to_string()));
        }

        let password_hash = self.member_repo
            .get_password_hash(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !AuthService::verify_password(password, &password_hash).await? {
            tracing::info!(email = %email, "Login rejected");
            return Err(AppError::Unauthorized);
        }

        self.member_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Creates a member and any listed dependents. Without an explicit
    /// password the credential is the member's lower-cased email.
    pub async fn provision_member(&self, mut request: CreateMemberRequest) -> Result<(Member, Vec<Dependent>)> {
        request.normalize();
        request.validate()?;
        request.email = normalize_email(&request.email);

        if self.member_repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let mut seen = HashSet::new();
        seen.insert(request.member_number.clone());
        for dependent in &request.dependents {
            if !seen.insert(dependent.member_number.clone()) {
                return Err(AppError::Conflict(format!(
                    "Member number {} appears more than once",
                    dependent.member_number
                )));
            }
        }
        for number in &seen {
            self.ensure_member_number_free(number).await?;
        }

        let password = request.password.clone().unwrap_or_else(|| request.email.clone());
        let password_hash = AuthService::hash_password(&password).await?;

        let (member, dependents) = self.member_repo.create(&request, &password_hash).await?;

        tracing::info!(
            member_number = %member.member_number,
            dependents = dependents.len(),
            is_admin = member.is_admin,
            "Member provisioned"
        );

        Ok((member, dependents))
    }

    pub async fn add_dependent(&self, owner_number: &str, mut request: CreateDependentRequest) -> Result<Dependent> {
        request.normalize();
        request.validate()?;

        let owner = self.get_by_member_number(owner_number).await?;
        self.ensure_member_number_free(&request.member_number).await?;

        let dependent = self.dependent_repo.create(owner.id, &request).await?;
        tracing::info!(
            owner = %owner.member_number,
            member_number = %dependent.member_number,
            "Dependent added"
        );

        Ok(dependent)
    }

    pub async fn update_status(&self, member_number: &str, request: UpdateStatusRequest) -> Result<Member> {
        request.validate()?;

        let expiry_date = request.expiry_date.as_deref().map(str::trim);
        if let Some(raw) = expiry_date {
            if parse_expiry(raw).is_none() {
                return Err(AppError::BadRequest(format!("Invalid expiry date: {}", raw)));
            }
        }

        let member = self.get_by_member_number(member_number).await?;
        let status = MemberStatus::from(request.status.trim());

        let updated = self.member_repo
            .update_status(member.id, &status, expiry_date)
            .await?;

        tracing::info!(
            member_number = %updated.member_number,
            status = %updated.status,
            expiry_date = %updated.expiry_date,
            "Member status changed"
        );

        Ok(updated)
    }

    /// Creates an admin, or promotes the member already holding that email.
    /// Returns the member and whether it was newly created.
    pub async fn ensure_admin(&self, mut request: CreateMemberRequest) -> Result<(Member, bool)> {
        let email = normalize_email(&request.email);

        if let Some(existing) = self.member_repo.find_by_email(&email).await? {
            let member = if existing.is_admin {
                existing
            } else {
                self.member_repo.set_admin(existing.id, true).await?
            };
            return Ok((member, false));
        }

        request.is_admin = true;
        let (member, _) = self.provision_member(request).await?;
        Ok((member, true))
    }

    pub async fn profile(&self, email: &str) -> Result<MemberProfile> {
        let member = self.member_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        let family_members = self.dependent_repo.list_for_member(member.id).await?;
        let attendance = self.attendance_repo
            .history_for_member(member.id, &member.member_number, PROFILE_HISTORY_LIMIT)
            .await?;

        Ok(MemberProfile { member, family_members, attendance })
    }

    async fn get_by_member_number(&self, member_number: &str) -> Result<Member> {
        self.member_repo
            .find_by_member_number(member_number.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    async fn ensure_member_number_free(&self, member_number: &str) -> Result<()> {
        if self.member_repo.is_member_number_taken(member_number).await? {
            return Err(AppError::Conflict(format!(
                "Member number {} already exists",
                member_number
            )));
        }
        Ok(())
    }
}
