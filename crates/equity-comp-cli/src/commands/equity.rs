use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use equity_comp_core::compensation::{self, CompensationInput};
use equity_comp_core::config::RsuConfig;
use equity_comp_core::equity::projection;
use equity_comp_core::vesting::{self, RsuGrant, VestingSchedule};

use crate::input;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Arguments for the yearly equity projection
#[derive(Args)]
pub struct EquityArgs {
    /// Path to a JSON config file (params, grants, espp)
    #[arg(long)]
    pub input: Option<String>,

    /// Projection anchor date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_equity(args: EquityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: RsuConfig = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for equity projection".into());
    };

    let as_of = args.as_of.unwrap_or_else(today);
    let result = projection::project_equity(as_of, &config.grants, &config.espp, &config.params)?;
    Ok(serde_json::to_value(result)?)
}

/// Equity config plus the cash compensation block.
#[derive(Deserialize)]
struct TotalCompRequest {
    compensation: CompensationInput,
    #[serde(flatten)]
    equity: RsuConfig,
}

/// Arguments for the total compensation projection
#[derive(Args)]
pub struct TotalCompArgs {
    /// Path to a JSON config file (compensation, params, grants, espp)
    #[arg(long)]
    pub input: Option<String>,

    /// Projection anchor date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_total_comp(args: TotalCompArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: TotalCompRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for total compensation".into());
    };

    let as_of = args.as_of.unwrap_or_else(today);
    let equity = projection::project_equity(
        as_of,
        &request.equity.grants,
        &request.equity.espp,
        &request.equity.params,
    )?;
    let result = compensation::project_compensation(
        &request.compensation,
        &equity.result,
        request.equity.params.usd_per_gbp,
        request.equity.params.display_currency,
    )?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Deserialize)]
struct VestingRequest {
    grants: Vec<RsuGrant>,
}

/// Arguments for the vesting schedule expansion
#[derive(Args)]
pub struct VestingArgs {
    /// Path to a JSON input file with a "grants" array (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total shares in the grant
    #[arg(long)]
    pub shares: Option<u64>,

    /// Grant date (YYYY-MM-DD)
    #[arg(long)]
    pub grant_date: Option<NaiveDate>,

    /// First vest date (YYYY-MM-DD); defaults to the grant date
    #[arg(long)]
    pub vest_start: Option<NaiveDate>,

    /// Schedule code: 1y-cliff, 3y-annual, 3y-6m, 4y-annual, 4y-6m, 4y-3m
    #[arg(long)]
    pub schedule: Option<VestingSchedule>,

    /// Share price on the grant date
    #[arg(long)]
    pub grant_price: Option<Decimal>,
}

pub fn run_vesting(args: VestingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: VestingRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let shares = args.shares.ok_or("--shares is required (or provide --input)")?;
        let grant_date = args
            .grant_date
            .ok_or("--grant-date is required (or provide --input)")?;
        let schedule = args
            .schedule
            .ok_or("--schedule is required (or provide --input)")?;

        VestingRequest {
            grants: vec![RsuGrant {
                id: "grant-1".to_string(),
                grant_date,
                vest_start_date: args.vest_start.unwrap_or(grant_date),
                total_shares: shares,
                grant_price: args.grant_price.unwrap_or_default(),
                schedule,
            }],
        }
    };

    let mut events = Vec::new();
    for grant in &request.grants {
        grant.validate()?;
        for event in vesting::expand_grant(grant) {
            events.push(serde_json::json!({
                "grant_id": grant.id,
                "schedule": grant.schedule.code(),
                "date": event.date,
                "shares": event.shares,
            }));
        }
    }
    Ok(Value::Array(events))
}
