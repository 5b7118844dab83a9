//! Price series types: raw trade aggregates and regular price points.

use crate::domain::graph::NATIVE_CODE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl AssetId {
    pub fn new(code: impl Into<String>, issuer: Option<String>) -> Self {
        Self {
            code: code.into(),
            issuer: issuer.filter(|i| !i.is_empty()),
        }
    }

    pub fn native() -> Self {
        Self::new(NATIVE_CODE, None)
    }

    pub fn is_native(&self) -> bool {
        self.code == NATIVE_CODE && self.issuer.is_none()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: AssetId,
    pub counter: AssetId,
}

impl AssetPair {
    pub fn new(base: AssetId, counter: AssetId) -> Self {
        Self { base, counter }
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.counter)
    }
}

/// Inclusive `[start_ms, end_ms]` window in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn contains(&self, ms: i64) -> bool {
        ms >= self.start_ms && ms <= self.end_ms
    }
}

/// One OHLCV bucket as returned by the trade aggregation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub timestamp_ms: i64,
    pub trade_count: u64,
    pub base_volume: f64,
    pub counter_volume: f64,
    pub avg: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
}

impl PricePoint {
    /// A point with open = high = low = close = `price` and zero volume.
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price,
            volume: 0.0,
            high: price,
            low: price,
            open: price,
            close: price,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    pub fn with_timestamp(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Convert an aggregate bucket. Returns `None` if the timestamp is out of range.
    pub fn from_aggregate(record: &AggregateRecord) -> Option<Self> {
        let timestamp = DateTime::from_timestamp_millis(record.timestamp_ms)?;
        Some(Self {
            timestamp,
            price: record.close,
            volume: record.base_volume,
            high: record.high,
            low: record.low,
            open: record.open,
            close: record.close,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    StellarDex,
    MockData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDataRequest {
    pub pair: AssetPair,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resolution_ms: i64,
}

impl HistoricalDataRequest {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start.timestamp_millis(), self.end.timestamp_millis())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataResponse {
    pub resolution_ms: i64,
    pub data_points: Vec<PricePoint>,
    pub data_source: DataSource,
    pub using_mock_data: bool,
}
