use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::EquityCompError;
use crate::types::Money;
use crate::EquityCompResult;

/// How a grant releases its shares over time.
///
/// Codes match the saved-configuration format ("4y-6m" = vest over 4 years,
/// one tranche every 6 months). Unknown codes are rejected at the parse
/// boundary rather than silently mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VestingSchedule {
    #[serde(rename = "1y-cliff")]
    Cliff1y,
    #[serde(rename = "3y-annual")]
    Annual3y,
    #[serde(rename = "3y-6m")]
    Semiannual3y,
    #[serde(rename = "4y-annual")]
    Annual4y,
    #[serde(rename = "4y-6m")]
    Semiannual4y,
    #[serde(rename = "4y-3m")]
    Quarterly4y,
}

impl VestingSchedule {
    pub fn periods(&self) -> u32 {
        match self {
            VestingSchedule::Cliff1y => 1,
            VestingSchedule::Annual3y => 3,
            VestingSchedule::Semiannual3y => 6,
            VestingSchedule::Annual4y => 4,
            VestingSchedule::Semiannual4y => 8,
            VestingSchedule::Quarterly4y => 16,
        }
    }

    pub fn interval_months(&self) -> u32 {
        match self {
            VestingSchedule::Cliff1y | VestingSchedule::Annual3y | VestingSchedule::Annual4y => 12,
            VestingSchedule::Semiannual3y | VestingSchedule::Semiannual4y => 6,
            VestingSchedule::Quarterly4y => 3,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            VestingSchedule::Cliff1y => "1y-cliff",
            VestingSchedule::Annual3y => "3y-annual",
            VestingSchedule::Semiannual3y => "3y-6m",
            VestingSchedule::Annual4y => "4y-annual",
            VestingSchedule::Semiannual4y => "4y-6m",
            VestingSchedule::Quarterly4y => "4y-3m",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VestingSchedule::Cliff1y => "1 Year Cliff (100% after 1 year)",
            VestingSchedule::Annual3y => "3 Years Annual (3 periods)",
            VestingSchedule::Semiannual3y => "3 Years Semi-Annual (6 periods)",
            VestingSchedule::Annual4y => "4 Years Annual (4 periods)",
            VestingSchedule::Semiannual4y => "4 Years Semi-Annual (8 periods)",
            VestingSchedule::Quarterly4y => "4 Years Quarterly (16 periods)",
        }
    }
}

impl FromStr for VestingSchedule {
    type Err = EquityCompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1y-cliff" => Ok(VestingSchedule::Cliff1y),
            "3y-annual" => Ok(VestingSchedule::Annual3y),
            "3y-6m" => Ok(VestingSchedule::Semiannual3y),
            "4y-annual" => Ok(VestingSchedule::Annual4y),
            "4y-6m" => Ok(VestingSchedule::Semiannual4y),
            "4y-3m" => Ok(VestingSchedule::Quarterly4y),
            other => Err(EquityCompError::InvalidInput {
                field: "vesting_schedule".into(),
                reason: format!("unknown schedule code '{other}'"),
            }),
        }
    }
}

/// An RSU grant as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsuGrant {
    pub id: String,
    pub grant_date: NaiveDate,
    pub vest_start_date: NaiveDate,
    pub total_shares: u64,
    /// Share price on the grant date, in the stock's native currency.
    pub grant_price: Money,
    pub schedule: VestingSchedule,
}

impl RsuGrant {
    pub fn validate(&self) -> EquityCompResult<()> {
        if self.vest_start_date < self.grant_date {
            return Err(EquityCompError::InvalidInput {
                field: "vest_start_date".into(),
                reason: "vest_start_date must be on or after grant_date".into(),
            });
        }
        Ok(())
    }
}

/// A single vesting event derived from a grant. Recomputed on every run,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEvent {
    pub date: NaiveDate,
    pub shares: u64,
}

/// Expand a grant into its discrete vesting events.
///
/// Shares divide evenly across the schedule's periods; the remainder goes
/// one share per period to the earliest vests, so no share is ever lost or
/// invented. The first tranche vests on the vest-start date itself.
pub fn expand_grant(grant: &RsuGrant) -> Vec<VestingEvent> {
    let periods = grant.schedule.periods();
    let interval = grant.schedule.interval_months();
    let base = grant.total_shares / periods as u64;
    let remainder = grant.total_shares - base * periods as u64;

    (0..periods)
        .map(|i| {
            let date = grant
                .vest_start_date
                .checked_add_months(Months::new(i * interval))
                .unwrap_or(grant.vest_start_date);
            let shares = base + u64::from((i as u64) < remainder);
            VestingEvent { date, shares }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn grant(total: u64, schedule: VestingSchedule) -> RsuGrant {
        RsuGrant {
            id: "g1".into(),
            grant_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            vest_start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            total_shares: total,
            grant_price: dec!(250),
            schedule,
        }
    }

    // ---------------------------------------------------------------
    // 1. Schedule lookup table
    // ---------------------------------------------------------------
    #[test]
    fn test_schedule_details() {
        assert_eq!(VestingSchedule::Cliff1y.periods(), 1);
        assert_eq!(VestingSchedule::Cliff1y.interval_months(), 12);
        assert_eq!(VestingSchedule::Semiannual4y.periods(), 8);
        assert_eq!(VestingSchedule::Semiannual4y.interval_months(), 6);
        assert_eq!(VestingSchedule::Quarterly4y.periods(), 16);
        assert_eq!(VestingSchedule::Quarterly4y.interval_months(), 3);
    }

    // ---------------------------------------------------------------
    // 2. Unknown schedule codes fail loudly
    // ---------------------------------------------------------------
    #[test]
    fn test_unknown_schedule_code_rejected() {
        assert!("unknown".parse::<VestingSchedule>().is_err());
        assert!("4y-6m".parse::<VestingSchedule>().is_ok());
    }

    #[test]
    fn test_schedule_serde_codes_round_trip() {
        for s in [
            VestingSchedule::Cliff1y,
            VestingSchedule::Annual3y,
            VestingSchedule::Semiannual3y,
            VestingSchedule::Annual4y,
            VestingSchedule::Semiannual4y,
            VestingSchedule::Quarterly4y,
        ] {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.code()));
            let back: VestingSchedule = serde_json::from_str(&json).unwrap();
            assert_eq!(back, s);
        }
    }

    // ---------------------------------------------------------------
    // 3. Even division across periods
    // ---------------------------------------------------------------
    #[test]
    fn test_even_division() {
        let events = expand_grant(&grant(1600, VestingSchedule::Semiannual4y));
        assert_eq!(events.len(), 8);
        assert!(events.iter().all(|e| e.shares == 200));
    }

    // ---------------------------------------------------------------
    // 4. Remainder shares land on the earliest vests
    // ---------------------------------------------------------------
    #[test]
    fn test_remainder_distribution() {
        // 1703 / 16 = 106 r 7: first 7 tranches get 107
        let events = expand_grant(&grant(1703, VestingSchedule::Quarterly4y));
        assert_eq!(events.len(), 16);
        for (i, e) in events.iter().enumerate() {
            let expected = if i < 7 { 107 } else { 106 };
            assert_eq!(e.shares, expected, "tranche {i}");
        }
    }

    // ---------------------------------------------------------------
    // 5. Share conservation: no tranche gained or lost
    // ---------------------------------------------------------------
    #[test]
    fn test_share_conservation() {
        for total in [1, 7, 16, 100, 1600, 1703, 99_999] {
            for schedule in [
                VestingSchedule::Cliff1y,
                VestingSchedule::Annual3y,
                VestingSchedule::Semiannual3y,
                VestingSchedule::Annual4y,
                VestingSchedule::Semiannual4y,
                VestingSchedule::Quarterly4y,
            ] {
                let events = expand_grant(&grant(total, schedule));
                let sum: u64 = events.iter().map(|e| e.shares).sum();
                assert_eq!(sum, total, "{total} shares on {:?}", schedule);
            }
        }
    }

    // ---------------------------------------------------------------
    // 6. Event dates step by the schedule interval
    // ---------------------------------------------------------------
    #[test]
    fn test_event_dates() {
        let events = expand_grant(&grant(800, VestingSchedule::Semiannual4y));
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2026, 7, 15).unwrap());
        assert_eq!(events[7].date, NaiveDate::from_ymd_opt(2029, 7, 15).unwrap());
    }

    // ---------------------------------------------------------------
    // 7. Grant validation
    // ---------------------------------------------------------------
    #[test]
    fn test_vest_start_before_grant_rejected() {
        let mut g = grant(100, VestingSchedule::Annual4y);
        g.vest_start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(g.validate().is_err());
        assert!(grant(100, VestingSchedule::Annual4y).validate().is_ok());
    }
}
