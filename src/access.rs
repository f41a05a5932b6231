/// loan visibility: owners and grantees view, only owners grant or revoke
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Entity, LoanError, Result};
use crate::types::{Loan, LoanAccess, ResharePolicy, Share, UserId, VisibleLoan};

/// outcome of a share request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareGrant {
    /// new share, to be persisted
    Created(Share),
    /// pair already existed; nothing to persist
    Unchanged(Share),
}

impl ShareGrant {
    pub fn share(&self) -> &Share {
        match self {
            ShareGrant::Created(share) | ShareGrant::Unchanged(share) => share,
        }
    }

    pub fn into_share(self) -> Share {
        match self {
            ShareGrant::Created(share) | ShareGrant::Unchanged(share) => share,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessController {
    reshare_policy: ResharePolicy,
}

impl AccessController {
    pub fn new(reshare_policy: ResharePolicy) -> Self {
        Self { reshare_policy }
    }

    pub fn reshare_policy(&self) -> ResharePolicy {
        self.reshare_policy
    }

    /// owner, or holder of a share on this loan
    pub fn can_view(&self, user_id: UserId, loan: &Loan, grantees: &HashSet<UserId>) -> bool {
        loan.is_owned_by(user_id) || grantees.contains(&user_id)
    }

    pub fn ensure_can_view(
        &self,
        user_id: UserId,
        loan: &Loan,
        grantees: &HashSet<UserId>,
    ) -> Result<()> {
        if self.can_view(user_id, loan, grantees) {
            Ok(())
        } else {
            Err(LoanError::Forbidden {
                user_id,
                loan_id: loan.id,
            })
        }
    }

    pub fn ensure_owner(&self, user_id: UserId, loan: &Loan) -> Result<()> {
        if loan.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(LoanError::NotOwner {
                user_id,
                loan_id: loan.id,
            })
        }
    }

    /// authorize the owner granting `grantee_id` view access
    ///
    /// `existing` are the loan's current shares.
    pub fn share_loan(
        &self,
        owner_id: UserId,
        loan: &Loan,
        grantee_id: UserId,
        existing: &[Share],
        granted_at: DateTime<Utc>,
    ) -> Result<ShareGrant> {
        self.ensure_owner(owner_id, loan)?;

        if loan.is_owned_by(grantee_id) {
            return Err(LoanError::ShareWithOwner { loan_id: loan.id });
        }

        if let Some(share) = existing
            .iter()
            .find(|s| s.loan_id == loan.id && s.grantee_id == grantee_id)
        {
            return self.reshare(share.clone());
        }

        Ok(ShareGrant::Created(Share {
            loan_id: loan.id,
            grantee_id,
            granted_at,
        }))
    }

    /// apply the re-share policy to a share the pair already holds
    pub fn reshare(&self, held: Share) -> Result<ShareGrant> {
        match self.reshare_policy {
            ResharePolicy::Reject => Err(LoanError::AlreadyShared {
                loan_id: held.loan_id,
                grantee_id: held.grantee_id,
            }),
            ResharePolicy::Ignore => Ok(ShareGrant::Unchanged(held)),
        }
    }

    /// authorize the owner removing a share
    pub fn revoke_share(
        &self,
        owner_id: UserId,
        loan: &Loan,
        grantee_id: UserId,
        existing: &[Share],
    ) -> Result<()> {
        self.ensure_owner(owner_id, loan)?;

        if existing.iter().any(|s| s.loan_id == loan.id && s.grantee_id == grantee_id) {
            Ok(())
        } else {
            Err(LoanError::not_found(Entity::Share, grantee_id))
        }
    }

    /// owned loans plus loans shared with the user, each loan once
    ///
    /// A loan the user owns and is also shared on is listed as owned.
    /// Results are ordered by creation time, then id.
    pub fn visible_loans(
        &self,
        user_id: UserId,
        owned: Vec<Loan>,
        shared: Vec<Loan>,
    ) -> Vec<VisibleLoan> {
        let mut by_id: HashMap<_, VisibleLoan> = HashMap::new();

        for loan in shared {
            let access = if loan.is_owned_by(user_id) {
                LoanAccess::Owner
            } else {
                LoanAccess::Grantee
            };
            by_id.insert(loan.id, VisibleLoan { loan, access });
        }
        for loan in owned.into_iter().filter(|l| l.is_owned_by(user_id)) {
            by_id.insert(
                loan.id,
                VisibleLoan {
                    loan,
                    access: LoanAccess::Owner,
                },
            );
        }

        let mut visible: Vec<_> = by_id.into_values().collect();
        visible.sort_by(|a, b| {
            (a.loan.created_at, a.loan.id).cmp(&(b.loan.created_at, b.loan.id))
        });
        visible
    }
}
