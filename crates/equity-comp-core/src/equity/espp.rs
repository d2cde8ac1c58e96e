use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityCompError;
use crate::pricing::{months_between, projected_price};
use crate::tax::income_and_ni;
use crate::types::{Money, Rate, Shares};
use crate::EquityCompResult;

/// ESPP plan parameters as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsppConfig {
    pub enabled: bool,
    /// Payroll deduction per month, in GBP.
    pub monthly_contribution: Money,
    /// Annual escalation of the monthly contribution.
    pub contribution_growth: Rate,
    /// Purchase discount off the lookback price, as a fraction in [0, 1).
    pub discount: Rate,
    /// Purchase window length in months: 3, 6 or 12.
    pub purchase_period_months: u32,
    /// Contributions before this date are skipped. Defaults to the
    /// projection's `as_of` anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl EsppConfig {
    pub fn disabled() -> Self {
        EsppConfig {
            enabled: false,
            monthly_contribution: Decimal::ZERO,
            contribution_growth: Decimal::ZERO,
            discount: Decimal::ZERO,
            purchase_period_months: 6,
            start_date: None,
        }
    }

    pub fn validate(&self) -> EquityCompResult<()> {
        if self.discount < Decimal::ZERO || self.discount >= Decimal::ONE {
            return Err(EquityCompError::InvalidInput {
                field: "discount".into(),
                reason: "discount must be in [0, 1)".into(),
            });
        }
        if !matches!(self.purchase_period_months, 3 | 6 | 12) {
            return Err(EquityCompError::InvalidInput {
                field: "purchase_period_months".into(),
                reason: "purchase period must be 3, 6 or 12 months".into(),
            });
        }
        Ok(())
    }
}

/// Accumulated ESPP position from all purchase windows up to a month horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsppPosition {
    pub shares: Shares,
    /// Cumulative payroll contributions, GBP.
    pub invested_gbp: Money,
    /// Market value of the shares at purchase, USD. This is the CGT cost
    /// basis: the discount element was already taxed as employment income.
    pub cost_basis: Money,
    pub taxes_paid: Money,
}

/// Simulate every completed purchase window within `months_elapsed` months
/// of `as_of`.
///
/// Windows sit on a fixed grid anchored at `as_of`. A configured start date
/// only gates contributions: months before it contribute nothing, and a
/// window that straddles it accumulates only its post-start months.
pub fn accumulate_purchases(
    config: &EsppConfig,
    as_of: NaiveDate,
    months_elapsed: u32,
    current_price: Money,
    annual_growth: Rate,
    income_tax_rate: Rate,
    ni_rate: Rate,
    usd_per_gbp: Decimal,
) -> EsppPosition {
    let mut pos = EsppPosition::default();
    if !config.enabled || config.monthly_contribution <= Decimal::ZERO {
        return pos;
    }

    let start_offset = config
        .start_date
        .map(|d| months_between(as_of, d).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    let period = config.purchase_period_months;
    let windows = months_elapsed / period;
    let escalation = Decimal::ONE + config.contribution_growth;

    for w in 0..windows {
        let window_start = w * period;
        let window_end = (w + 1) * period;

        if Decimal::from(window_end) <= start_offset {
            continue;
        }

        let mut contribution_gbp = Decimal::ZERO;
        for month in window_start..window_end {
            let m = Decimal::from(month);
            if m < start_offset {
                continue;
            }
            let years_since_start = (m - start_offset) / dec!(12);
            contribution_gbp += config.monthly_contribution * escalation.powd(years_since_start);
        }
        if contribution_gbp.is_zero() {
            continue;
        }

        let price_start = projected_price(current_price, annual_growth, Decimal::from(window_start));
        let price_end = projected_price(current_price, annual_growth, Decimal::from(window_end));
        // Lookback plan: buy at the lower of the window's endpoint prices,
        // less the discount. Shares are delivered at the window end, so the
        // end price is the market value for tax purposes.
        let market_price = price_end;
        let purchase_price = price_start.min(price_end) * (Decimal::ONE - config.discount);

        pos.invested_gbp += contribution_gbp;
        if purchase_price <= Decimal::ZERO {
            // Degenerate price: money went in but no meaningful share count
            // can be computed, and a worthless stock carries no tax charge.
            continue;
        }

        let contribution_usd = contribution_gbp * usd_per_gbp;
        let shares = contribution_usd / purchase_price;
        let discount_value = shares * (market_price - purchase_price);
        let tax = income_and_ni(discount_value, income_tax_rate, ni_rate);

        pos.shares += shares;
        pos.cost_basis += shares * market_price;
        pos.taxes_paid += tax.total;
    }

    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EsppConfig {
        EsppConfig {
            enabled: true,
            monthly_contribution: dec!(1000),
            contribution_growth: Decimal::ZERO,
            discount: dec!(0.15),
            purchase_period_months: 6,
            start_date: None,
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 13).unwrap()
    }

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal) {
        let diff = (actual - expected).abs();
        assert!(diff < tol, "expected {expected}, got {actual} (diff {diff})");
    }

    // ---------------------------------------------------------------
    // 1. One flat-price window: contribution, discount and cost basis
    // ---------------------------------------------------------------
    #[test]
    fn test_single_window_flat_price() {
        let pos = accumulate_purchases(
            &config(),
            as_of(),
            6,
            dec!(100),
            Decimal::ZERO,
            dec!(0.45),
            dec!(0.02),
            dec!(1.3),
        );

        assert_eq!(pos.invested_gbp, dec!(6000));
        // £6,000 -> $7,800 at 1.3; purchase at 85 -> 91.7647 shares
        assert_close(pos.shares, dec!(91.7647), dec!(0.001));
        // Cost basis at market ($100), not the discounted price
        assert_close(pos.cost_basis, dec!(9176.47), dec!(0.01));
        // Discount value = shares * $15, taxed at 47%
        assert_close(pos.taxes_paid, dec!(91.7647) * dec!(15) * dec!(0.47), dec!(0.01));
    }

    // ---------------------------------------------------------------
    // 2. Disabled plans and incomplete windows buy nothing
    // ---------------------------------------------------------------
    #[test]
    fn test_disabled_or_incomplete() {
        let mut cfg = config();
        cfg.enabled = false;
        let pos = accumulate_purchases(
            &cfg, as_of(), 12, dec!(100), Decimal::ZERO, dec!(0.45), dec!(0.02), dec!(1.3),
        );
        assert_eq!(pos, EsppPosition::default());

        // 5 months elapsed < one 6-month window
        let pos = accumulate_purchases(
            &config(), as_of(), 5, dec!(100), Decimal::ZERO, dec!(0.45), dec!(0.02), dec!(1.3),
        );
        assert_eq!(pos.shares, Decimal::ZERO);
    }

    // ---------------------------------------------------------------
    // 3. Lookback takes the lower endpoint price
    // ---------------------------------------------------------------
    #[test]
    fn test_lookback_uses_lower_price() {
        // Falling stock: end price below start price, so the purchase
        // discounts off the end price
        let pos = accumulate_purchases(
            &config(), as_of(), 6, dec!(100), dec!(-0.20), dec!(0.45), dec!(0.02), dec!(1.3),
        );
        let price_end = projected_price(dec!(100), dec!(-0.20), dec!(6));
        let expected_shares = dec!(6000) * dec!(1.3) / (price_end * dec!(0.85));
        assert_close(pos.shares, expected_shares, dec!(0.001));
    }

    // ---------------------------------------------------------------
    // 4. Contribution escalation compounds fractionally per month
    // ---------------------------------------------------------------
    #[test]
    fn test_contribution_escalation() {
        let mut cfg = config();
        cfg.contribution_growth = dec!(0.05);
        let pos = accumulate_purchases(
            &cfg, as_of(), 12, dec!(100), Decimal::ZERO, dec!(0.45), dec!(0.02), dec!(1.3),
        );
        // Escalating contributions beat the flat £12,000 across two windows
        assert!(pos.invested_gbp > dec!(12_000));
        assert!(pos.invested_gbp < dec!(12_000) * dec!(1.05));
    }

    // ---------------------------------------------------------------
    // 5. Start date gates contributions month-by-month
    // ---------------------------------------------------------------
    #[test]
    fn test_start_date_skips_early_months() {
        let mut cfg = config();
        // Starts 3 months (~91 days) into the first window
        cfg.start_date = NaiveDate::from_ymd_opt(2026, 1, 13);
        let pos = accumulate_purchases(
            &cfg, as_of(), 6, dec!(100), Decimal::ZERO, dec!(0.45), dec!(0.02), dec!(1.3),
        );
        // Only the months on or after the start date contribute
        assert!(pos.invested_gbp < dec!(6000));
        assert!(pos.invested_gbp >= dec!(2000));

        // A start date past the horizon means no contributions at all
        cfg.start_date = NaiveDate::from_ymd_opt(2027, 1, 1);
        let pos = accumulate_purchases(
            &cfg, as_of(), 6, dec!(100), Decimal::ZERO, dec!(0.45), dec!(0.02), dec!(1.3),
        );
        assert_eq!(pos.invested_gbp, Decimal::ZERO);
    }

    // ---------------------------------------------------------------
    // 6. Validation bounds
    // ---------------------------------------------------------------
    #[test]
    fn test_validation() {
        let mut cfg = config();
        assert!(cfg.validate().is_ok());
        cfg.discount = dec!(1);
        assert!(cfg.validate().is_err());
        cfg.discount = dec!(0.15);
        cfg.purchase_period_months = 4;
        assert!(cfg.validate().is_err());
    }
}
