//! Total compensation: cash components netted of income tax, stacked with
//! the year-over-year equity gain from an equity projection.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::equity::projection::YearlyRow;
use crate::error::EquityCompError;
use crate::types::{with_metadata, ComputationOutput, Currency, Money, Rate};
use crate::EquityCompResult;

/// Cash compensation inputs. All amounts are annual and in GBP; growth
/// rates are annual fractions applied from year 2 onward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationInput {
    pub base_salary: Money,
    pub salary_growth: Rate,
    /// Bonus as a fraction of the year-1 base salary.
    pub bonus_pct: Rate,
    pub bonus_growth: Rate,
    pub car_allowance: Money,
    pub car_allowance_growth: Rate,
    /// Marginal income tax rate for netting cash components. Cash here is
    /// already above the NI upper earnings limit band modelled elsewhere,
    /// so only income tax is deducted.
    pub income_tax_rate: Rate,
}

impl CompensationInput {
    pub fn validate(&self) -> EquityCompResult<()> {
        if self.base_salary < Decimal::ZERO {
            return Err(EquityCompError::InvalidInput {
                field: "base_salary".into(),
                reason: "base salary cannot be negative".into(),
            });
        }
        if self.income_tax_rate < Decimal::ZERO || self.income_tax_rate > Decimal::ONE {
            return Err(EquityCompError::InvalidInput {
                field: "income_tax_rate".into(),
                reason: "tax rates must be fractions between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationYearRow {
    pub year: u32,
    pub net_base_salary: Money,
    pub net_bonus: Money,
    pub net_car_allowance: Money,
    /// Net cash: salary + bonus + car allowance after income tax.
    pub total_cash: Money,
    /// Increase in total equity value over the prior year, in the display
    /// currency. Gross of CGT: the disposal tax is a separate line in the
    /// equity projection, not a deduction from yearly income.
    pub equity_gain: Money,
    pub total_compensation: Money,
}

// Grow a year-1 amount by (1 + rate) per elapsed year. Iterative to stay
// exact for whole-year exponents.
fn grown(amount: Money, rate: Rate, year: u32) -> Money {
    let factor = Decimal::ONE + rate;
    let mut value = amount;
    for _ in 1..year {
        value *= factor;
    }
    value
}

/// Stack net cash compensation on top of an equity projection's yearly
/// gains. The row count follows `equity_rows`; cash amounts are converted
/// from GBP when the display currency is USD.
pub fn project_compensation(
    input: &CompensationInput,
    equity_rows: &[YearlyRow],
    usd_per_gbp: Decimal,
    display_currency: Currency,
) -> EquityCompResult<ComputationOutput<Vec<CompensationYearRow>>> {
    let start = Instant::now();

    input.validate()?;
    if usd_per_gbp <= Decimal::ZERO {
        return Err(EquityCompError::DivisionByZero {
            context: "usd_per_gbp exchange rate must be positive".into(),
        });
    }

    let mut warnings = Vec::new();
    if input.salary_growth > dec!(0.20) {
        warnings.push(format!(
            "Salary growth of {}% per year is unusually high",
            input.salary_growth * dec!(100)
        ));
    }

    let net_factor = Decimal::ONE - input.income_tax_rate;
    let fx = match display_currency {
        Currency::Gbp => Decimal::ONE,
        Currency::Usd => usd_per_gbp,
    };
    let bonus_year1 = input.base_salary * input.bonus_pct;

    let mut rows = Vec::with_capacity(equity_rows.len());
    let mut prior_value = Decimal::ZERO;

    for equity in equity_rows {
        let year = equity.year;
        let net_base = grown(input.base_salary, input.salary_growth, year) * net_factor * fx;
        let net_bonus = grown(bonus_year1, input.bonus_growth, year) * net_factor * fx;
        let net_car = grown(input.car_allowance, input.car_allowance_growth, year) * net_factor * fx;
        let total_cash = net_base + net_bonus + net_car;

        let equity_value = match display_currency {
            Currency::Gbp => equity.total_value_gbp,
            Currency::Usd => equity.total_value_usd,
        };
        let equity_gain = equity_value - prior_value;
        prior_value = equity_value;

        rows.push(CompensationYearRow {
            year,
            net_base_salary: net_base,
            net_bonus,
            net_car_allowance: net_car,
            total_cash,
            equity_gain,
            total_compensation: total_cash + equity_gain,
        });
    }

    Ok(with_metadata(
        "Total compensation: cash components netted of income tax and grown annually, \
         plus the year-over-year change in total equity value",
        &serde_json::json!({
            "input": input,
            "years": equity_rows.len(),
            "display_currency": display_currency,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        rows,
    ))
}
