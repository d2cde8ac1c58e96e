//! Saved configuration files. One JSON document holds either an equity
//! setup or a pension setup, discriminated by `configType`, so the two
//! calculators can share a config directory.

use serde::{Deserialize, Serialize};

#[cfg(feature = "equity")]
use crate::equity::espp::EsppConfig;
#[cfg(feature = "equity")]
use crate::equity::projection::GlobalParams;
#[cfg(feature = "pension")]
use crate::pension::{ContributionInput, PensionPot};
#[cfg(feature = "equity")]
use crate::vesting::RsuGrant;

/// Full equity calculator state: market assumptions, grants and ESPP plan.
#[cfg(feature = "equity")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsuConfig {
    pub params: GlobalParams,
    #[serde(default)]
    pub grants: Vec<RsuGrant>,
    pub espp: EsppConfig,
}

/// Full pension calculator state.
#[cfg(feature = "pension")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PensionConfig {
    #[serde(default)]
    pub pots: Vec<PensionPot>,
    pub contributions: ContributionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "configType", rename_all = "lowercase")]
pub enum SavedConfig {
    #[cfg(feature = "equity")]
    Rsu(RsuConfig),
    #[cfg(feature = "pension")]
    Pension(PensionConfig),
}
