use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.45 = 45%). Never as percentages.
pub type Rate = Decimal;

/// Share quantities. RSU lots vest in whole shares; ESPP purchases are
/// fractional.
pub type Shares = Decimal;

/// The two currencies the projections deal in: the stock's native currency
/// and the employee's home currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Gbp,
}

/// Fallback USD-per-GBP rate used whenever no live exchange rate has been
/// fetched yet (or the fetch failed).
pub const DEFAULT_USD_PER_GBP: Decimal = dec!(1.3);

/// A stock quote as delivered by the (external) price fetch client.
/// Consumed as plain data; the engine never fetches anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub price: Money,
    pub change: Money,
    pub change_percent: Decimal,
    pub as_of: NaiveDate,
}

/// A GBP/USD exchange rate as delivered by the (external) rate fetch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub usd_per_gbp: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate {
            usd_per_gbp: DEFAULT_USD_PER_GBP,
            as_of: None,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
