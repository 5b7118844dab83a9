//! Core domain types and logic.

pub mod error;
pub mod strategy;
pub mod graph;
pub mod chain;
pub mod vault;
pub mod compiler;
pub mod vault_validation;
pub mod price;
pub mod resolution;
pub mod gap_fill;
pub mod synthetic;
pub mod price_history;
pub mod config_validation;
