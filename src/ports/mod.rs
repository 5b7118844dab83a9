//! Port traits implemented by adapters.

pub mod aggregate_port;
pub mod config_port;
