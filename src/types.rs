use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a user
pub type UserId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// the inputs that fully determine a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
        }
    }
}

/// fixed-rate installment loan, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner_id: UserId,
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms::new(self.principal, self.annual_rate, self.term_months)
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

/// grant letting a non-owner view a loan and its schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub loan_id: LoanId,
    pub grantee_id: UserId,
    pub granted_at: DateTime<Utc>,
}

impl Share {
    /// shares are identified by the (loan, grantee) pair alone
    pub fn key(&self) -> (LoanId, UserId) {
        (self.loan_id, self.grantee_id)
    }
}

/// how a user came to see a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanAccess {
    Owner,
    Grantee,
}

/// a loan in a user's listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleLoan {
    pub loan: Loan,
    pub access: LoanAccess,
}

/// behaviour when an owner shares a loan with someone who already has it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResharePolicy {
    /// report AlreadyShared
    #[default]
    Reject,
    /// return the existing share unchanged
    Ignore,
}
