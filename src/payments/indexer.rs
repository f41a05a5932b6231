use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

use super::amortization::{Schedule, ScheduleEntry};

/// position of a loan after a given month's payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub month: u32,
    pub entry: ScheduleEntry,
    pub current_principal_balance: Money,
    pub aggregate_principal_paid: Money,
    pub aggregate_interest_paid: Money,
}

impl LoanSummary {
    pub fn aggregate_paid(&self) -> Money {
        self.aggregate_principal_paid + self.aggregate_interest_paid
    }
}

/// month lookups over a materialized schedule
pub struct ScheduleIndexer;

impl ScheduleIndexer {
    /// entry for a 1-based month
    pub fn entry_for_month(schedule: &Schedule, month: u32) -> Result<&ScheduleEntry> {
        schedule.get_entry(month).ok_or(LoanError::MonthOutOfRange {
            month,
            term_months: schedule.len() as u32,
        })
    }

    /// balances and running totals as of the end of a month
    pub fn summary_for_month(schedule: &Schedule, month: u32) -> Result<LoanSummary> {
        let entry = Self::entry_for_month(schedule, month)?;
        Ok(LoanSummary {
            month,
            current_principal_balance: entry.remaining_balance,
            aggregate_principal_paid: entry.cumulative_principal,
            aggregate_interest_paid: entry.cumulative_interest,
            entry: entry.clone(),
        })
    }
}
