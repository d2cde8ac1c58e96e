use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use equity_comp_core::compensation::{self, CompensationInput};
use equity_comp_core::config::{PensionConfig, RsuConfig};
use equity_comp_core::equity::projection;
use equity_comp_core::pension;
use equity_comp_core::vesting;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Equity
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EquityRequest {
    as_of: NaiveDate,
    #[serde(flatten)]
    config: RsuConfig,
}

#[napi]
pub fn project_equity(input_json: String) -> NapiResult<String> {
    let request: EquityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = projection::project_equity(
        request.as_of,
        &request.config.grants,
        &request.config.espp,
        &request.config.params,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct TotalCompRequest {
    as_of: NaiveDate,
    compensation: CompensationInput,
    #[serde(flatten)]
    config: RsuConfig,
}

#[napi]
pub fn project_total_compensation(input_json: String) -> NapiResult<String> {
    let request: TotalCompRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let equity = projection::project_equity(
        request.as_of,
        &request.config.grants,
        &request.config.espp,
        &request.config.params,
    )
    .map_err(to_napi_error)?;
    let output = compensation::project_compensation(
        &request.compensation,
        &equity.result,
        request.config.params.usd_per_gbp,
        request.config.params.display_currency,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn expand_vesting_schedule(input_json: String) -> NapiResult<String> {
    let grant: vesting::RsuGrant = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    grant.validate().map_err(to_napi_error)?;
    let events = vesting::expand_grant(&grant);
    serde_json::to_string(&events).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pension
// ---------------------------------------------------------------------------

#[napi]
pub fn project_pension(input_json: String) -> NapiResult<String> {
    let config: PensionConfig = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        pension::project_pension(&config.pots, &config.contributions).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PensionCompareRequest {
    selected: Vec<String>,
    #[serde(flatten)]
    config: PensionConfig,
}

#[napi]
pub fn compare_pension_pots(input_json: String) -> NapiResult<String> {
    let request: PensionCompareRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pension::compare_pots(
        &request.config.pots,
        &request.config.contributions,
        &request.selected,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
