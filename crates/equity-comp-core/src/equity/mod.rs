pub mod espp;
pub mod projection;
pub mod rsu;
