use std::sync::Arc;

use crate::{
    domain::Member,
    error::{AppError, Result},
    repository::{DependentRepository, MemberRepository},
};

/// Who a scanned code belongs to. Points always go to `owner`, even when the
/// code was a dependent's.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub owner: Member,
    pub display_name: String,
    /// The code as scanned; recorded on the ledger row.
    pub member_number: String,
    pub via_dependent: bool,
}

pub struct MembershipResolver {
    member_repo: Arc<dyn MemberRepository>,
    dependent_repo: Arc<dyn DependentRepository>,
}

impl MembershipResolver {
    pub fn new(
        member_repo: Arc<dyn MemberRepository>,
        dependent_repo: Arc<dyn DependentRepository>,
    ) -> Self {
        Self { member_repo, dependent_repo }
    }

    /// Primary member numbers win over dependent numbers.
    pub async fn resolve(&self, code: &str) -> Result<ResolvedIdentity> {
        if let Some(member) = self.member_repo.find_by_member_number(code).await? {
            return Ok(ResolvedIdentity {
                display_name: member.full_name(),
                member_number: code.to_string(),
                owner: member,
                via_dependent: false,
            });
        }

        if let Some(dependent) = self.dependent_repo.find_by_member_number(code).await? {
            let owner = self.member_repo.find_by_id(dependent.member_id).await?;
            return match owner {
                Some(owner) => Ok(ResolvedIdentity {
                    owner,
                    display_name: dependent.name,
                    member_number: code.to_string(),
                    via_dependent: true,
                }),
                None => {
                    tracing::warn!(member_number = %code, "Dependent has no owning member");
                    Err(AppError::NotFound("Member not found".to_string()))
                }
            };
        }

        Err(AppError::NotFound("Member not found".to_string()))
    }
}
