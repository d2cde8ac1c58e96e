//! Multi-year equity projection: RSU vesting, ESPP purchases, ISA
//! sheltering and UK capital gains tax, folded into one yearly table.

use std::time::Instant;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::equity::espp::{accumulate_purchases, EsppConfig};
use crate::equity::rsu::{accumulate_vested, RsuPosition};
use crate::error::EquityCompError;
use crate::pricing::projected_price;
use crate::tax::cgt;
use crate::types::{with_metadata, ComputationOutput, Currency, Money, Rate, Shares};
use crate::vesting::{expand_grant, RsuGrant, VestingEvent};
use crate::EquityCompResult;

fn default_usd_per_gbp() -> Decimal {
    crate::types::DEFAULT_USD_PER_GBP
}

/// ISA sheltering parameters. Each enabled allowance adds annual capacity;
/// sheltered holdings are exempt from CGT on disposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsaParams {
    pub own_allowance: Money,
    pub own_enabled: bool,
    pub spouse_allowance: Money,
    pub spouse_enabled: bool,
}

impl IsaParams {
    pub fn annual_capacity(&self) -> Money {
        let mut capacity = Decimal::ZERO;
        if self.own_enabled {
            capacity += self.own_allowance;
        }
        if self.spouse_enabled {
            capacity += self.spouse_allowance;
        }
        capacity
    }
}

/// Market and tax assumptions shared by every year of the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalParams {
    pub current_stock_price: Money,
    /// Annual stock growth as a fraction (0.07 = 7%/yr).
    pub annual_stock_growth: Rate,
    /// Marginal income tax rate applied to vesting gains and ESPP discounts.
    pub income_tax_rate: Rate,
    /// Employee National Insurance rate. NI applies to employment income
    /// only, never to capital gains.
    pub ni_rate: Rate,
    pub cgt_rate: Rate,
    /// Annual CGT exempt amount, GBP.
    pub cgt_allowance: Money,
    #[serde(default = "default_usd_per_gbp")]
    pub usd_per_gbp: Decimal,
    pub projection_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isa: Option<IsaParams>,
    #[serde(default)]
    pub display_currency: Currency,
}

impl GlobalParams {
    pub fn validate(&self) -> EquityCompResult<()> {
        if self.current_stock_price <= Decimal::ZERO {
            return Err(EquityCompError::InvalidInput {
                field: "current_stock_price".into(),
                reason: "stock price must be positive".into(),
            });
        }
        if self.projection_years == 0 || self.projection_years > 50 {
            return Err(EquityCompError::InvalidInput {
                field: "projection_years".into(),
                reason: "projection horizon must be between 1 and 50 years".into(),
            });
        }
        if self.usd_per_gbp <= Decimal::ZERO {
            return Err(EquityCompError::DivisionByZero {
                context: "usd_per_gbp exchange rate must be positive".into(),
            });
        }
        for (name, rate) in [
            ("income_tax_rate", self.income_tax_rate),
            ("ni_rate", self.ni_rate),
            ("cgt_rate", self.cgt_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(EquityCompError::InvalidInput {
                    field: name.into(),
                    reason: "tax rates must be fractions between 0 and 1".into(),
                });
            }
        }
        if self.cgt_allowance < Decimal::ZERO {
            return Err(EquityCompError::InvalidInput {
                field: "cgt_allowance".into(),
                reason: "CGT allowance cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// One projection year. Values are cumulative positions as of the year end,
/// not per-year deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: u32,
    pub display_year: i32,
    pub stock_price: Money,
    pub rsu_net_shares: u64,
    pub espp_shares: Shares,
    pub rsu_value_usd: Money,
    pub espp_value_usd: Money,
    pub rsu_value_gbp: Money,
    pub espp_value_gbp: Money,
    pub total_value_usd: Money,
    pub total_value_gbp: Money,
    pub espp_invested_gbp: Money,
    pub isa_sheltered_gbp: Money,
    /// Taxable gain on the unsheltered portion if sold this year, GBP.
    pub capital_gain_gbp: Money,
    pub cgt_tax_gbp: Money,
    /// Portfolio value less CGT on a full disposal, in the display currency.
    pub net_proceeds_after_cgt: Money,
    /// Cumulative income tax and NI withheld at vest/purchase, USD.
    pub taxes_paid_usd: Money,
}

/// Project RSU and ESPP positions year by year, with a hypothetical full
/// disposal at each year end to surface the CGT exposure.
///
/// ISA sheltering is modelled as a steady drip: each year the combined
/// allowance capacity moves that much of the unsheltered portfolio into
/// the wrapper, capped at the portfolio's value. Gains on the sheltered
/// fraction are CGT-exempt.
pub fn project_equity(
    as_of: NaiveDate,
    grants: &[RsuGrant],
    espp: &EsppConfig,
    params: &GlobalParams,
) -> EquityCompResult<ComputationOutput<Vec<YearlyRow>>> {
    let start = Instant::now();

    params.validate()?;
    espp.validate()?;
    for grant in grants {
        grant.validate()?;
    }

    let mut warnings = Vec::new();
    if params.annual_stock_growth > dec!(0.30) {
        warnings.push(format!(
            "Annual stock growth of {}% is unusually high for a multi-year projection",
            params.annual_stock_growth * dec!(100)
        ));
    }
    if grants.is_empty() && !espp.enabled {
        warnings.push("No grants and ESPP disabled: projection will be all zeros".to_string());
    }

    let events: Vec<VestingEvent> = grants.iter().flat_map(expand_grant).collect();
    let isa_capacity = params
        .isa
        .as_ref()
        .map(IsaParams::annual_capacity)
        .unwrap_or(Decimal::ZERO);

    let mut rows = Vec::with_capacity(params.projection_years as usize);
    let mut sheltered_gbp = Decimal::ZERO;

    for year in 1..=params.projection_years {
        let target = as_of
            .checked_add_months(Months::new(year * 12))
            .ok_or_else(|| EquityCompError::DateError(format!("year {year} overflows the calendar")))?;
        // Year marks sit on exact whole-year exponents; only intra-year
        // event offsets use the 30-day-month day count
        let stock_price = projected_price(
            params.current_stock_price,
            params.annual_stock_growth,
            Decimal::from(year * 12),
        );

        let rsu: RsuPosition = accumulate_vested(
            &events,
            as_of,
            target,
            params.current_stock_price,
            params.annual_stock_growth,
            params.income_tax_rate,
            params.ni_rate,
        );
        let espp_pos = accumulate_purchases(
            espp,
            as_of,
            year * 12,
            params.current_stock_price,
            params.annual_stock_growth,
            params.income_tax_rate,
            params.ni_rate,
            params.usd_per_gbp,
        );

        let rsu_value_usd = Decimal::from(rsu.net_shares) * stock_price;
        let espp_value_usd = espp_pos.shares * stock_price;
        let rsu_value_gbp = rsu_value_usd / params.usd_per_gbp;
        let espp_value_gbp = espp_value_usd / params.usd_per_gbp;
        let total_value_usd = rsu_value_usd + espp_value_usd;
        let total_value_gbp = total_value_usd / params.usd_per_gbp;

        sheltered_gbp = (sheltered_gbp + isa_capacity).min(total_value_gbp);
        let isa_ratio = if total_value_gbp > Decimal::ZERO {
            (sheltered_gbp / total_value_gbp).min(Decimal::ONE)
        } else {
            Decimal::ZERO
        };

        // Gains are floored at zero per source: an RSU loss does not offset
        // an ESPP gain in this model.
        let rsu_gain_usd = (rsu_value_usd - rsu.cost_basis).max(Decimal::ZERO);
        let espp_gain_usd = (espp_value_usd - espp_pos.cost_basis).max(Decimal::ZERO);
        let gain_gbp = (rsu_gain_usd + espp_gain_usd) / params.usd_per_gbp;
        let capital_gain_gbp = gain_gbp * (Decimal::ONE - isa_ratio);
        let cgt_tax_gbp = cgt(capital_gain_gbp, params.cgt_allowance, params.cgt_rate);

        let net_gbp = total_value_gbp - cgt_tax_gbp;
        let net_proceeds = match params.display_currency {
            Currency::Gbp => net_gbp,
            Currency::Usd => net_gbp * params.usd_per_gbp,
        };

        rows.push(YearlyRow {
            year,
            display_year: as_of.year() + year as i32,
            stock_price,
            rsu_net_shares: rsu.net_shares,
            espp_shares: espp_pos.shares,
            rsu_value_usd,
            espp_value_usd,
            rsu_value_gbp,
            espp_value_gbp,
            total_value_usd,
            total_value_gbp,
            espp_invested_gbp: espp_pos.invested_gbp,
            isa_sheltered_gbp: sheltered_gbp,
            capital_gain_gbp,
            cgt_tax_gbp,
            net_proceeds_after_cgt: net_proceeds,
            taxes_paid_usd: rsu.taxes_paid + espp_pos.taxes_paid,
        });
    }

    Ok(with_metadata(
        "Yearly equity projection: sell-to-cover RSU vesting, lookback ESPP purchases, \
         ISA sheltering drip, CGT on hypothetical full disposal at each year end",
        &serde_json::json!({
            "as_of": as_of,
            "grants": grants.len(),
            "espp_enabled": espp.enabled,
            "params": params,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        rows,
    ))
}
