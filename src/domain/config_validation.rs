//! Configuration validation.
//!
//! Checks every section before a command touches the network or the
//! filesystem. Absent keys fall back to defaults; present keys must be valid.

use crate::domain::compiler::MultiAssetMode;
use crate::domain::error::VaultError;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub const MAX_AGGREGATION_LIMIT: i64 = 200;

/// Where the `prices` command reads aggregates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSource {
    #[default]
    Horizon,
    Csv,
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizon" => Ok(Self::Horizon),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown price source '{other}', expected horizon or csv")),
        }
    }
}

pub fn validate_app_config(config: &dyn ConfigPort) -> Result<(), VaultError> {
    validate_horizon(config)?;
    validate_prices(config)?;
    validate_synthetic(config)?;
    validate_compiler(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> VaultError {
    VaultError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), VaultError> {
    if let Some(url) = config.get_string("horizon", "url") {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid("horizon", "url", "url must start with http:// or https://"));
        }
    }
    if let Some(raw) = config.get_string("horizon", "timeout_secs") {
        match raw.trim().parse::<i64>() {
            Ok(secs) if secs > 0 => {}
            _ => return Err(invalid("horizon", "timeout_secs", "timeout_secs must be a positive integer")),
        }
    }
    if let Some(raw) = config.get_string("horizon", "limit") {
        match raw.trim().parse::<i64>() {
            Ok(limit) if (1..=MAX_AGGREGATION_LIMIT).contains(&limit) => {}
            _ => {
                return Err(invalid(
                    "horizon",
                    "limit",
                    format!("limit must be between 1 and {MAX_AGGREGATION_LIMIT}"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_prices(config: &dyn ConfigPort) -> Result<(), VaultError> {
    let source = price_source(config)?;
    if source == PriceSource::Csv && config.get_string("prices", "csv_dir").is_none() {
        return Err(VaultError::ConfigMissing {
            section: "prices".to_string(),
            key: "csv_dir".to_string(),
        });
    }
    Ok(())
}

fn validate_synthetic(config: &dyn ConfigPort) -> Result<(), VaultError> {
    synthetic_seed(config).map(|_| ())
}

fn validate_compiler(config: &dyn ConfigPort) -> Result<(), VaultError> {
    multi_asset_mode(config).map(|_| ())
}

/// `[prices] source`, defaulting to Horizon.
pub fn price_source(config: &dyn ConfigPort) -> Result<PriceSource, VaultError> {
    match config.get_string("prices", "source") {
        None => Ok(PriceSource::default()),
        Some(s) => s.parse().map_err(|reason: String| invalid("prices", "source", reason)),
    }
}

/// `[synthetic] seed`, if configured.
pub fn synthetic_seed(config: &dyn ConfigPort) -> Result<Option<u64>, VaultError> {
    match config.get_string("synthetic", "seed") {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| invalid("synthetic", "seed", "seed must be a non-negative integer")),
    }
}

/// `[compiler] multi_asset`, defaulting to the first upstream asset only.
pub fn multi_asset_mode(config: &dyn ConfigPort) -> Result<MultiAssetMode, VaultError> {
    match config.get_string("compiler", "multi_asset") {
        None => Ok(MultiAssetMode::default()),
        Some(s) => s
            .parse()
            .map_err(|reason: String| invalid("compiler", "multi_asset", reason)),
    }
}
