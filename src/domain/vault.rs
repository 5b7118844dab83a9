//! Canonical vault configuration: the persisted, deployable form of a strategy.

use crate::domain::strategy::{
    CustomParameters, IntervalSpec, LiquiditySpec, RebalanceSpec, StakeSpec, SwapSpec,
    ThresholdSpec,
};
use serde::{Deserialize, Deserializer, Serialize};

pub const FORMAT_VERSION: &str = "1.0";

/// One asset and its target share. An empty issuer reads as no issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub code: String,
    #[serde(
        default,
        deserialize_with = "non_empty_issuer",
        skip_serializing_if = "Option::is_none"
    )]
    pub issuer: Option<String>,
    pub allocation: f64,
}

fn non_empty_issuer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let issuer = Option::<String>::deserialize(deserializer)?;
    Ok(issuer.filter(|s| !s.is_empty()))
}

/// Condition parameters plus the asset the condition observes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoped<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(flatten)]
    pub spec: T,
}

impl<T> Scoped<T> {
    pub fn new(asset: Option<String>, spec: T) -> Self {
        Self { asset, spec }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum RuleCondition {
    Allocation(Scoped<ThresholdSpec>),
    ApyThreshold(Scoped<ThresholdSpec>),
    TimeBased(Scoped<IntervalSpec>),
    PriceChange(Scoped<ThresholdSpec>),
    Custom(CustomParameters),
}

impl RuleCondition {
    /// The asset identifier this condition refers to, if any.
    pub fn asset(&self) -> Option<&str> {
        match self {
            RuleCondition::Allocation(s)
            | RuleCondition::ApyThreshold(s)
            | RuleCondition::PriceChange(s) => s.asset.as_deref(),
            RuleCondition::TimeBased(s) => s.asset.as_deref(),
            RuleCondition::Custom(fields) => fields.get("asset").and_then(|v| v.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum RuleAction {
    Rebalance(RebalanceSpec),
    Stake(StakeSpec),
    ProvideLiquidity(LiquiditySpec),
    Swap(SwapSpec),
    Custom(CustomParameters),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: RuleCondition,
    pub action: RuleAction,
    /// Every upstream asset of the chain. Only populated when compiling with
    /// `MultiAssetMode::AllAssets`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<String>,
}

impl Rule {
    /// Identifiers of the assets wired into this rule's condition.
    pub fn referenced_assets(&self) -> Vec<&str> {
        if !self.assets.is_empty() {
            return self.assets.iter().map(String::as_str).collect();
        }
        self.condition.asset().into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_format_version")]
    pub format_version: String,
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

impl Default for VaultMetadata {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            format_version: default_format_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfiguration {
    pub assets: Vec<AssetAllocation>,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub metadata: VaultMetadata,
}

impl VaultConfiguration {
    pub fn allocation_total(&self) -> f64 {
        self.assets.iter().map(|a| a.allocation).sum()
    }

    pub fn find_asset(&self, code: &str) -> Option<&AssetAllocation> {
        self.assets.iter().find(|a| a.code == code)
    }
}
