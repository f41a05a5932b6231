use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{LoanId, UserId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("month {month} out of range: schedule has {term_months} periods")]
    MonthOutOfRange {
        month: u32,
        term_months: u32,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: Entity,
        id: Uuid,
    },

    #[error("user {user_id} may not view loan {loan_id}")]
    Forbidden {
        user_id: UserId,
        loan_id: LoanId,
    },

    #[error("user {user_id} does not own loan {loan_id}")]
    NotOwner {
        user_id: UserId,
        loan_id: LoanId,
    },

    #[error("loan {loan_id} already shared with {grantee_id}")]
    AlreadyShared {
        loan_id: LoanId,
        grantee_id: UserId,
    },

    #[error("loan {loan_id} cannot be shared with its owner")]
    ShareWithOwner {
        loan_id: LoanId,
    },

    #[error("invalid user: {message}")]
    InvalidUser {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

/// referenced entity kinds for not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    User,
    Loan,
    Share,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Loan => "loan",
            Entity::Share => "share",
        };
        f.write_str(name)
    }
}

/// payload-free tag for mapping errors onto transport statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidLoanTerms,
    MonthOutOfRange,
    NotFound,
    Forbidden,
    NotOwner,
    AlreadyShared,
    ShareWithOwner,
    InvalidUser,
    InvalidConfiguration,
}

impl LoanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::InvalidLoanTerms { .. } => ErrorKind::InvalidLoanTerms,
            LoanError::MonthOutOfRange { .. } => ErrorKind::MonthOutOfRange,
            LoanError::NotFound { .. } => ErrorKind::NotFound,
            LoanError::Forbidden { .. } => ErrorKind::Forbidden,
            LoanError::NotOwner { .. } => ErrorKind::NotOwner,
            LoanError::AlreadyShared { .. } => ErrorKind::AlreadyShared,
            LoanError::ShareWithOwner { .. } => ErrorKind::ShareWithOwner,
            LoanError::InvalidUser { .. } => ErrorKind::InvalidUser,
            LoanError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
        }
    }

    pub(crate) fn invalid_terms(message: impl Into<String>) -> Self {
        LoanError::InvalidLoanTerms {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: Entity, id: Uuid) -> Self {
        LoanError::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
