//! Concrete adapter implementations for ports.

#[cfg(feature = "horizon")]
pub mod horizon_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
