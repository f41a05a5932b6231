use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::interest::RateConverter;
use crate::types::LoanTerms;

/// one period of an amortization schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub period_index: u32,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    /// balance after this period's payment
    pub remaining_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// full amortization schedule, a pure function of the loan terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub terms: LoanTerms,
    pub periodic_rate: Rate,
    /// level payment rounded to the minor unit
    pub level_payment: Money,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl Schedule {
    /// generate the schedule for a set of loan terms
    pub fn generate(terms: LoanTerms) -> Result<Self> {
        AmortizationEngine::new().compute(terms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// entry for a 1-based period, if it exists
    pub fn get_entry(&self, period_index: u32) -> Option<&ScheduleEntry> {
        let idx = (period_index as usize).checked_sub(1)?;
        self.entries.get(idx)
    }

    pub fn final_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.last()
    }

    /// remaining balance after the given period, principal before period 1
    pub fn balance_after(&self, period_index: u32) -> Money {
        self.get_entry(period_index)
            .map(|e| e.remaining_balance)
            .unwrap_or(self.terms.principal)
    }
}

/// fixed-rate, level-payment amortization
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationEngine;

impl AmortizationEngine {
    pub fn new() -> Self {
        Self
    }

    /// compute the full schedule for principal, annual rate and term
    pub fn compute_schedule(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
    ) -> Result<Schedule> {
        self.compute(LoanTerms::new(principal, annual_rate, term_months))
    }

    pub fn compute(&self, terms: LoanTerms) -> Result<Schedule> {
        validate_terms(&terms)?;

        let LoanTerms {
            principal,
            annual_rate,
            term_months,
        } = terms;

        let periodic_rate = RateConverter::to_periodic_rate(annual_rate);
        let level_payment = Money::from_decimal(level_payment(principal, periodic_rate, term_months)?);

        let mut entries = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;
        let mut cumulative_principal = Money::ZERO;
        let overflow = || LoanError::invalid_terms("principal too large for the schedule totals");

        for period_index in 1..=term_months {
            let interest_portion = balance.interest_at(periodic_rate).ok_or_else(overflow)?;

            // final period clears whatever rounding left behind
            let principal_portion = if period_index == term_months {
                balance
            } else {
                (level_payment - interest_portion).max(Money::ZERO).min(balance)
            };

            let payment_amount = interest_portion
                .checked_add(principal_portion)
                .ok_or_else(overflow)?;
            let remaining_balance = balance - principal_portion;

            cumulative_interest = cumulative_interest
                .checked_add(interest_portion)
                .ok_or_else(overflow)?;
            cumulative_principal = cumulative_principal
                .checked_add(principal_portion)
                .ok_or_else(overflow)?;

            entries.push(ScheduleEntry {
                period_index,
                beginning_balance: balance,
                payment_amount,
                interest_portion,
                principal_portion,
                remaining_balance,
                cumulative_interest,
                cumulative_principal,
            });

            balance = remaining_balance;
        }

        let total_payment =
            Money::checked_sum(entries.iter().map(|e| e.payment_amount)).ok_or_else(overflow)?;

        debug!(
            principal = %principal,
            annual_rate = %annual_rate,
            term_months,
            level_payment = %level_payment,
            total_interest = %cumulative_interest,
            "computed amortization schedule"
        );

        Ok(Schedule {
            terms,
            periodic_rate,
            level_payment,
            entries,
            total_interest: cumulative_interest,
            total_payment,
        })
    }
}

/// check the engine preconditions, naming the failing field
pub fn validate_terms(terms: &LoanTerms) -> Result<()> {
    if !terms.principal.is_positive() {
        return Err(LoanError::invalid_terms(format!(
            "principal must be positive, got {}",
            terms.principal
        )));
    }
    if terms.annual_rate.is_negative() {
        return Err(LoanError::invalid_terms(format!(
            "annual rate must not be negative, got {}",
            terms.annual_rate
        )));
    }
    if terms.term_months == 0 {
        return Err(LoanError::invalid_terms("term must be at least one month"));
    }
    Ok(())
}

/// unrounded level payment A = P * r / (1 - (1 + r)^-n)
fn level_payment(principal: Money, periodic_rate: Rate, term_months: u32) -> Result<Decimal> {
    let p = principal.as_decimal();
    let n = Decimal::from(term_months);
    let r = periodic_rate.as_decimal();

    if r.is_zero() {
        return Ok(p / n);
    }

    // evaluated as P * r * g / (g - 1) with g = (1 + r)^n
    let overflow = || LoanError::invalid_terms("rate and term overflow the payment calculation");
    let growth = RateConverter::compound_factor(periodic_rate, term_months).ok_or_else(overflow)?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        // rate too small to register at decimal precision
        return Ok(p / n);
    }

    let numerator = p
        .checked_mul(r)
        .and_then(|x| x.checked_mul(growth))
        .ok_or_else(overflow)?;
    numerator.checked_div(denominator).ok_or_else(overflow)
}
