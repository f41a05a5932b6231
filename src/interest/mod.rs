use rust_decimal::Decimal;

use crate::decimal::Rate;

/// converts nominal annual rates into per-period rates
#[derive(Debug, Clone, Copy, Default)]
pub struct RateConverter;

impl RateConverter {
    /// payment periods in a year
    pub const PERIODS_PER_YEAR: u32 = 12;

    /// monthly periodic rate from a nominal annual rate
    ///
    /// Inputs are not validated here; the amortization engine rejects
    /// negative rates before converting.
    pub fn to_periodic_rate(annual_rate: Rate) -> Rate {
        Rate::from_decimal(annual_rate.as_decimal() / Decimal::from(Self::PERIODS_PER_YEAR))
    }

    /// growth factor (1 + r)^n, or None if it overflows
    pub fn compound_factor(periodic_rate: Rate, periods: u32) -> Option<Decimal> {
        let base = Decimal::ONE.checked_add(periodic_rate.as_decimal())?;
        let mut factor = Decimal::ONE;
        for _ in 0..periods {
            factor = factor.checked_mul(base)?;
        }
        Some(factor)
    }

    /// effective annual yield of the nominal rate compounded monthly
    pub fn effective_annual_rate(annual_rate: Rate) -> Option<Rate> {
        let periodic = Self::to_periodic_rate(annual_rate);
        let factor = Self::compound_factor(periodic, Self::PERIODS_PER_YEAR)?;
        Some(Rate::from_decimal(factor - Decimal::ONE))
    }
}
