pub mod error;
pub mod pricing;
pub mod tax;
pub mod types;
pub mod vesting;

#[cfg(feature = "equity")]
pub mod equity;

#[cfg(feature = "equity")]
pub mod compensation;

#[cfg(feature = "pension")]
pub mod pension;

pub mod config;

pub use error::EquityCompError;
pub use types::*;

/// Standard result type for all projection operations
pub type EquityCompResult<T> = Result<T, EquityCompError>;
