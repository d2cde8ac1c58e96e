pub mod equity;
pub mod pension;
