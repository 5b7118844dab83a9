//! Semantic checks on a vault configuration.
//!
//! The compiler and `import_json` only guarantee structure. Callers that deploy
//! or backtest a configuration built outside the editor run these checks first.

use crate::domain::error::VaultError;
use crate::domain::vault::{AssetAllocation, VaultConfiguration};

pub const ALLOCATION_TOLERANCE: f64 = 0.01;
const MAX_ASSET_CODE_LEN: usize = 12;
const PUBLIC_KEY_LEN: usize = 56;

pub fn validate_vault(config: &VaultConfiguration) -> Result<(), VaultError> {
    for asset in &config.assets {
        validate_asset(asset)?;
    }
    validate_allocation_total(config)?;
    validate_rule_references(config)?;
    Ok(())
}

pub fn validate_asset(asset: &AssetAllocation) -> Result<(), VaultError> {
    validate_asset_code(&asset.code)?;
    if let Some(issuer) = &asset.issuer {
        validate_issuer(issuer)?;
    }
    if !(0.0..=100.0).contains(&asset.allocation) {
        return Err(VaultError::validation(format!(
            "allocation for {} must be between 0 and 100, got {}",
            asset.code, asset.allocation
        )));
    }
    Ok(())
}

pub fn validate_asset_code(code: &str) -> Result<(), VaultError> {
    if code.is_empty() || code.len() > MAX_ASSET_CODE_LEN {
        return Err(VaultError::validation(format!(
            "asset code '{code}' must be 1-{MAX_ASSET_CODE_LEN} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(VaultError::validation(format!(
            "asset code '{code}' must be alphanumeric"
        )));
    }
    Ok(())
}

/// Issuers are account public keys: 56 base32 characters starting with `G`.
pub fn validate_issuer(issuer: &str) -> Result<(), VaultError> {
    let well_formed = issuer.len() == PUBLIC_KEY_LEN
        && issuer.starts_with('G')
        && issuer
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c));
    if !well_formed {
        return Err(VaultError::validation(format!(
            "issuer '{issuer}' is not a valid account public key"
        )));
    }
    Ok(())
}

fn validate_allocation_total(config: &VaultConfiguration) -> Result<(), VaultError> {
    if config.assets.is_empty() {
        return Ok(());
    }
    let total = config.allocation_total();
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        return Err(VaultError::validation(format!(
            "allocations must sum to 100, got {total}"
        )));
    }
    Ok(())
}

fn validate_rule_references(config: &VaultConfiguration) -> Result<(), VaultError> {
    for (i, rule) in config.rules.iter().enumerate() {
        for identifier in rule.referenced_assets() {
            if config.find_asset(identifier).is_none() {
                return Err(VaultError::validation(format!(
                    "rule {i} references unknown asset '{identifier}'"
                )));
            }
        }
    }
    Ok(())
}
