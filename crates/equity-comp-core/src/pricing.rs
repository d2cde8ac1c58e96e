use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

const MONTHS_PER_YEAR: Decimal = dec!(12);
const DAYS_PER_MONTH: Decimal = dec!(30);

/// Projected share price after `months` of monthly-compounded growth:
/// `price0 * (1 + g)^(months / 12)`.
///
/// Negative growth shrinks the price toward (but never exactly to) zero.
/// A growth rate at or below -100% degenerates to a zero price for any
/// positive horizon.
pub fn projected_price(price0: Money, annual_growth: Rate, months: Decimal) -> Money {
    if months.is_zero() || annual_growth.is_zero() {
        return price0;
    }
    let base = Decimal::ONE + annual_growth;
    if base <= Decimal::ZERO {
        return if months > Decimal::ZERO {
            Decimal::ZERO
        } else {
            price0
        };
    }
    price0 * base.powd(months / MONTHS_PER_YEAR)
}

/// Signed whole-plus-fractional months between two dates, using the
/// 30-day-month approximation the rest of the projections share.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Decimal {
    Decimal::from((to - from).num_days()) / DAYS_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal) {
        let diff = (actual - expected).abs();
        assert!(diff < tol, "expected {expected}, got {actual} (diff {diff})");
    }

    // ---------------------------------------------------------------
    // 1. Identity at zero months and at zero growth
    // ---------------------------------------------------------------
    #[test]
    fn test_zero_months_returns_current_price() {
        assert_eq!(projected_price(dec!(100), dec!(0.10), Decimal::ZERO), dec!(100));
    }

    #[test]
    fn test_zero_growth_is_flat_forever() {
        for months in [dec!(1), dec!(7.066), dec!(12), dec!(240)] {
            assert_eq!(projected_price(dec!(100), Decimal::ZERO, months), dec!(100));
        }
    }

    // ---------------------------------------------------------------
    // 2. One full year of growth equals the annual rate
    // ---------------------------------------------------------------
    #[test]
    fn test_twelve_months_ten_percent() {
        let p = projected_price(dec!(100), dec!(0.10), dec!(12));
        assert_close(p, dec!(110), dec!(0.01));
    }

    // ---------------------------------------------------------------
    // 3. Half a year compounds geometrically, not linearly
    // ---------------------------------------------------------------
    #[test]
    fn test_six_months_ten_percent() {
        // 100 * 1.1^0.5 = 104.88...
        let p = projected_price(dec!(100), dec!(0.10), dec!(6));
        assert_close(p, dec!(104.88), dec!(0.01));
    }

    // ---------------------------------------------------------------
    // 4. Negative growth and degenerate rates
    // ---------------------------------------------------------------
    #[test]
    fn test_negative_growth() {
        let p = projected_price(dec!(100), dec!(-0.10), dec!(12));
        assert_close(p, dec!(90), dec!(0.01));
        assert!(p > Decimal::ZERO);
    }

    #[test]
    fn test_total_loss_growth_rate() {
        assert_eq!(projected_price(dec!(100), dec!(-1), dec!(6)), Decimal::ZERO);
        // At zero months even a degenerate rate leaves the spot price alone
        assert_eq!(projected_price(dec!(100), dec!(-1), Decimal::ZERO), dec!(100));
    }

    // ---------------------------------------------------------------
    // 5. Past dates produce negative month offsets
    // ---------------------------------------------------------------
    #[test]
    fn test_months_between() {
        let from = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 11, 12).unwrap();
        assert_eq!(months_between(from, to), dec!(1));
        assert_eq!(months_between(to, from), dec!(-1));
        assert_eq!(months_between(from, from), Decimal::ZERO);
    }

    #[test]
    fn test_price_before_now_discounts_backwards() {
        // A vest 12 months ago at 10% growth was cheaper than today
        let p = projected_price(dec!(110), dec!(0.10), dec!(-12));
        assert_close(p, dec!(100), dec!(0.01));
    }
}
