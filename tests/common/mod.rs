#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use vaultforge::domain::error::VaultError;
use vaultforge::domain::graph::{AssetType, GraphEdge, GraphNode, StrategyGraph};
use vaultforge::domain::price::{
    AggregateRecord, AssetId, AssetPair, HistoricalDataRequest, TimeWindow,
};
use vaultforge::domain::strategy::{
    ActionSpec, ConditionSpec, Operator, RebalanceSpec, StakeSpec, ThresholdSpec,
};
use vaultforge::ports::aggregate_port::AggregatePort;

pub const HOUR: i64 = 3_600_000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Aggregate source keyed by base asset code.
pub struct MockAggregatePort {
    pub data: HashMap<String, Vec<AggregateRecord>>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<(String, TimeWindow, i64)>>,
}

impl MockAggregatePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_records(mut self, base: &str, records: Vec<AggregateRecord>) -> Self {
        self.data.insert(base.to_string(), records);
        self
    }

    pub fn with_error(mut self, base: &str, reason: &str) -> Self {
        self.errors.insert(base.to_string(), reason.to_string());
        self
    }
}

impl AggregatePort for MockAggregatePort {
    fn fetch_aggregates(
        &self,
        pair: &AssetPair,
        window: TimeWindow,
        resolution_ms: i64,
    ) -> Result<Vec<AggregateRecord>, VaultError> {
        self.calls
            .borrow_mut()
            .push((pair.base.code.clone(), window, resolution_ms));
        if let Some(reason) = self.errors.get(&pair.base.code) {
            return Err(VaultError::provider(reason.clone()));
        }
        Ok(self.data.get(&pair.base.code).cloned().unwrap_or_default())
    }
}

pub fn make_record(timestamp_ms: i64, close: f64) -> AggregateRecord {
    AggregateRecord {
        timestamp_ms,
        trade_count: 5,
        base_volume: 1000.0,
        counter_volume: 1000.0 * close,
        avg: close,
        high: close * 1.02,
        low: close * 0.98,
        open: close,
        close,
    }
}

pub fn ms(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts).unwrap()
}

pub fn price_request(base: &str, start_ms: i64, end_ms: i64, resolution_ms: i64) -> HistoricalDataRequest {
    HistoricalDataRequest {
        pair: AssetPair::new(AssetId::new(base, None), AssetId::new("USDC", None)),
        start: ms(start_ms),
        end: ms(end_ms),
        resolution_ms,
    }
}

pub fn custom_asset(code: &str) -> AssetType {
    AssetType::Custom {
        asset_code: code.to_string(),
        asset_issuer: String::new(),
    }
}

pub fn allocation_gt(threshold: f64) -> ConditionSpec {
    ConditionSpec::Allocation(ThresholdSpec {
        operator: Operator::Gt,
        threshold,
    })
}

pub fn rebalance(target: &str, allocation: f64) -> ActionSpec {
    ActionSpec::Rebalance(RebalanceSpec {
        target_asset: target.to_string(),
        target_allocation: allocation,
    })
}

pub fn stake(percentage: f64) -> ActionSpec {
    ActionSpec::Stake(StakeSpec { percentage })
}

/// XLM 60% -> allocation > 50 -> rebalance USDC to 40.
pub fn make_simple_graph() -> StrategyGraph {
    StrategyGraph::new(
        vec![
            GraphNode::asset("a1", AssetType::Native, 60.0),
            GraphNode::asset("a2", AssetType::Stablecoin, 40.0),
            GraphNode::condition("c1", allocation_gt(50.0)),
            GraphNode::action("x1", rebalance("USDC", 40.0)),
        ],
        vec![GraphEdge::new("e1", "a1", "c1"), GraphEdge::new("e2", "c1", "x1")],
    )
}
