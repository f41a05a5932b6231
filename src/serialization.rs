/// serializable views for handing loans to a transport layer
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::payments::{LoanSummary, Schedule, ScheduleEntry};
use crate::types::{Loan, LoanAccess, LoanId, UserId, VisibleLoan};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub owner_id: UserId,
    pub principal: Money,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<LoanAccess>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        LoanView {
            id: loan.id,
            owner_id: loan.owner_id,
            principal: loan.principal,
            annual_rate_percent: loan.annual_rate.as_percentage().normalize(),
            term_months: loan.term_months,
            created_at: loan.created_at,
            access: None,
        }
    }

    pub fn from_visible(visible: &VisibleLoan) -> Self {
        LoanView {
            access: Some(visible.access),
            ..Self::from_loan(&visible.loan)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryView {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

impl From<&ScheduleEntry> for ScheduleEntryView {
    fn from(entry: &ScheduleEntry) -> Self {
        ScheduleEntryView {
            month: entry.period_index,
            payment: entry.payment_amount,
            interest: entry.interest_portion,
            principal: entry.principal_portion,
            remaining_balance: entry.remaining_balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub loan_id: LoanId,
    pub level_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    pub entries: Vec<ScheduleEntryView>,
}

impl ScheduleView {
    pub fn from_schedule(loan_id: LoanId, schedule: &Schedule) -> Self {
        ScheduleView {
            loan_id,
            level_payment: schedule.level_payment,
            total_interest: schedule.total_interest,
            total_payment: schedule.total_payment,
            entries: schedule.entries.iter().map(ScheduleEntryView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub loan_id: LoanId,
    pub month: u32,
    pub current_principal_balance: Money,
    pub aggregate_principal_paid: Money,
    pub aggregate_interest_paid: Money,
}

impl SummaryView {
    pub fn from_summary(loan_id: LoanId, summary: &LoanSummary) -> Self {
        SummaryView {
            loan_id,
            month: summary.month,
            current_principal_balance: summary.current_principal_balance,
            aggregate_principal_paid: summary.aggregate_principal_paid,
            aggregate_interest_paid: summary.aggregate_interest_paid,
        }
    }
}

/// convert any view to pretty-printed json
pub fn to_json_pretty<T: Serialize>(view: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}
