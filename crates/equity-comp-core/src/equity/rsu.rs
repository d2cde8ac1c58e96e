use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{months_between, projected_price};
use crate::tax::income_and_ni;
use crate::types::{Money, Rate};
use crate::vesting::VestingEvent;

/// Accumulated RSU position from all vesting events up to a target date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsuPosition {
    pub net_shares: u64,
    pub shares_sold_for_tax: u64,
    /// Gross market value of every tranche at its vest date.
    pub gross_value: Money,
    /// Market value of the retained shares at their vest dates. This is the
    /// CGT cost basis: the vesting gain was already taxed as income and must
    /// not be taxed again as a capital gain.
    pub cost_basis: Money,
    pub taxes_paid: Money,
}

/// Sell-to-cover fold over vesting events dated on or before `target`.
///
/// Events that vested before `as_of` still count; the price projector simply
/// discounts backwards for negative month offsets.
pub fn accumulate_vested(
    events: &[VestingEvent],
    as_of: NaiveDate,
    target: NaiveDate,
    current_price: Money,
    annual_growth: Rate,
    income_tax_rate: Rate,
    ni_rate: Rate,
) -> RsuPosition {
    let mut pos = RsuPosition::default();

    for event in events.iter().filter(|e| e.date <= target) {
        let months = months_between(as_of, event.date);
        let price_at_vest = projected_price(current_price, annual_growth, months);
        let gross = Decimal::from(event.shares) * price_at_vest;
        let tax = income_and_ni(gross, income_tax_rate, ni_rate);

        // Whole shares only; round up so the employee is never
        // under-withheld. A zero vest price means the tax cannot be covered
        // from the tranche at all: sell the lot.
        let sold = if price_at_vest <= Decimal::ZERO {
            event.shares
        } else {
            (tax.total / price_at_vest)
                .ceil()
                .to_u64()
                .map_or(event.shares, |n| n.min(event.shares))
        };

        let net = event.shares - sold;
        pos.net_shares += net;
        pos.shares_sold_for_tax += sold;
        pos.gross_value += gross;
        pos.cost_basis += Decimal::from(net) * price_at_vest;
        pos.taxes_paid += tax.total;
    }

    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(y: i32, m: u32, shares: u64) -> VestingEvent {
        VestingEvent {
            date: d(y, m, 15),
            shares,
        }
    }

    // ---------------------------------------------------------------
    // 1. Single tranche, flat price: 20% income tax, no NI
    // ---------------------------------------------------------------
    #[test]
    fn test_single_tranche_sell_to_cover() {
        let events = vec![event(2025, 8, 200)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2026, 1, 15),
            dec!(100),
            Decimal::ZERO,
            dec!(0.20),
            Decimal::ZERO,
        );

        assert_eq!(pos.gross_value, dec!(20_000));
        assert_eq!(pos.taxes_paid, dec!(4000));
        assert_eq!(pos.shares_sold_for_tax, 40);
        assert_eq!(pos.net_shares, 160);
        assert_eq!(pos.cost_basis, dec!(16_000));
    }

    // ---------------------------------------------------------------
    // 2. Shares conserved per event; never under-withheld
    // ---------------------------------------------------------------
    #[test]
    fn test_share_conservation_and_withholding() {
        let events = vec![event(2025, 8, 333), event(2026, 2, 333)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2026, 6, 15),
            dec!(137.41),
            dec!(0.10),
            dec!(0.45),
            dec!(0.02),
        );

        assert_eq!(pos.net_shares + pos.shares_sold_for_tax, 666);
        // Sold shares cover at least the tax owed at each vest price, which
        // in aggregate means sale proceeds >= taxes paid
        assert!(Decimal::from(pos.shares_sold_for_tax) * dec!(137.41) * dec!(1.1) >= pos.taxes_paid);
    }

    // ---------------------------------------------------------------
    // 3. Events after the target are excluded
    // ---------------------------------------------------------------
    #[test]
    fn test_target_date_cutoff() {
        let events = vec![event(2025, 8, 100), event(2026, 8, 100)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2026, 1, 15),
            dec!(100),
            Decimal::ZERO,
            dec!(0.20),
            Decimal::ZERO,
        );
        assert_eq!(pos.net_shares + pos.shares_sold_for_tax, 100);
    }

    // ---------------------------------------------------------------
    // 4. Degenerate zero price: sell everything, retain nothing
    // ---------------------------------------------------------------
    #[test]
    fn test_zero_price_sells_all() {
        let events = vec![event(2026, 8, 100)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2027, 1, 15),
            dec!(100),
            dec!(-1),
            dec!(0.45),
            dec!(0.02),
        );
        assert_eq!(pos.net_shares, 0);
        assert_eq!(pos.shares_sold_for_tax, 100);
        assert_eq!(pos.cost_basis, Decimal::ZERO);
    }

    // ---------------------------------------------------------------
    // 5. Confiscatory rates clamp the sale to the tranche
    // ---------------------------------------------------------------
    #[test]
    fn test_tax_above_hundred_percent_clamps() {
        let events = vec![event(2025, 8, 100)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2026, 1, 15),
            dec!(100),
            Decimal::ZERO,
            dec!(1.10),
            dec!(0.02),
        );
        assert_eq!(pos.shares_sold_for_tax, 100);
        assert_eq!(pos.net_shares, 0);
    }

    // ---------------------------------------------------------------
    // 6. Already-vested events (before as_of) still count
    // ---------------------------------------------------------------
    #[test]
    fn test_past_vests_included() {
        let events = vec![event(2024, 6, 100)];
        let pos = accumulate_vested(
            &events,
            d(2025, 1, 15),
            d(2026, 1, 15),
            dec!(100),
            Decimal::ZERO,
            dec!(0.20),
            Decimal::ZERO,
        );
        assert_eq!(pos.net_shares, 80);
    }
}
