use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Employment tax charged on a value at vest or purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub income_tax: Money,
    pub ni: Money,
    pub total: Money,
}

/// Income tax plus employee National Insurance on `value`.
pub fn income_and_ni(value: Money, income_tax_rate: Rate, ni_rate: Rate) -> TaxBreakdown {
    let income_tax = value * income_tax_rate;
    let ni = value * ni_rate;
    TaxBreakdown {
        income_tax,
        ni,
        total: income_tax + ni,
    }
}

/// Capital gains tax on a realised gain, after the annual allowance.
pub fn cgt(capital_gain: Money, allowance: Money, rate: Rate) -> Money {
    let taxable = (capital_gain - allowance).max(Decimal::ZERO);
    taxable * rate
}
