//! Strategy building blocks shared by editor nodes and compiled rules.
//!
//! Conditions and actions are sum types with one variant per kind. Adding a
//! variant forces every `match` in the compiler to be updated, so a new kind can
//! never fall through to the `custom` passthrough by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form parameters for the explicit `custom` condition/action kinds.
pub type CustomParameters = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

/// `{operator, threshold}` shape used by allocation, APY and price-change conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub operator: Operator,
    pub threshold: f64,
}

/// `{interval, unit}` shape used by time-based conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSpec {
    pub interval: u32,
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceSpec {
    pub target_asset: String,
    pub target_allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeSpec {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySpec {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSpec {
    pub from_asset: String,
    pub to_asset: String,
    pub percentage: f64,
}

/// Condition payload carried by a condition node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "conditionType", rename_all = "snake_case")]
pub enum ConditionSpec {
    Allocation(ThresholdSpec),
    ApyThreshold(ThresholdSpec),
    TimeBased(IntervalSpec),
    PriceChange(ThresholdSpec),
    Custom(CustomParameters),
}

impl ConditionSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionSpec::Allocation(_) => "allocation",
            ConditionSpec::ApyThreshold(_) => "apy_threshold",
            ConditionSpec::TimeBased(_) => "time_based",
            ConditionSpec::PriceChange(_) => "price_change",
            ConditionSpec::Custom(_) => "custom",
        }
    }
}

/// Action payload carried by an action node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actionType", rename_all = "snake_case")]
pub enum ActionSpec {
    Rebalance(RebalanceSpec),
    Stake(StakeSpec),
    ProvideLiquidity(LiquiditySpec),
    Swap(SwapSpec),
    Custom(CustomParameters),
}

impl ActionSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionSpec::Rebalance(_) => "rebalance",
            ActionSpec::Stake(_) => "stake",
            ActionSpec::ProvideLiquidity(_) => "provide_liquidity",
            ActionSpec::Swap(_) => "swap",
            ActionSpec::Custom(_) => "custom",
        }
    }
}
