//! CSV trade aggregate adapter for offline price history.
//!
//! One file per pair, `{BASE}_{COUNTER}.csv`, with a header row:
//! `timestamp_ms,trade_count,base_volume,counter_volume,avg,high,low,open,close`.
//!
//! Rows are buckets already aggregated at the requested resolution; the
//! adapter does not re-aggregate. Gaps are fine, but two rows closer together
//! than the resolution mean the file was sampled finer and it is rejected.

use crate::domain::error::VaultError;
use crate::domain::price::{AggregateRecord, AssetPair, TimeWindow};
use crate::ports::aggregate_port::AggregatePort;
use crate::ports::config_port::ConfigPort;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp_ms: i64,
    trade_count: u64,
    base_volume: f64,
    counter_volume: f64,
    avg: f64,
    high: f64,
    low: f64,
    open: f64,
    close: f64,
}

impl From<CsvRow> for AggregateRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            timestamp_ms: row.timestamp_ms,
            trade_count: row.trade_count,
            base_volume: row.base_volume,
            counter_volume: row.counter_volume,
            avg: row.avg,
            high: row.high,
            low: row.low,
            open: row.open,
            close: row.close,
        }
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VaultError> {
        let dir = config
            .get_string("prices", "csv_dir")
            .ok_or_else(|| VaultError::ConfigMissing {
                section: "prices".into(),
                key: "csv_dir".into(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, pair: &AssetPair) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", pair.base.code, pair.counter.code))
    }
}

impl AggregatePort for CsvAdapter {
    fn fetch_aggregates(
        &self,
        pair: &AssetPair,
        window: TimeWindow,
        resolution_ms: i64,
    ) -> Result<Vec<AggregateRecord>, VaultError> {
        let path = self.csv_path(pair);
        let content = fs::read_to_string(&path).map_err(|e| {
            VaultError::provider(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut records = Vec::new();
        for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                VaultError::provider(format!("{} row {}: {}", path.display(), line + 1, e))
            })?;
            if window.contains(row.timestamp_ms) {
                records.push(AggregateRecord::from(row));
            }
        }

        if records.is_empty() {
            return Err(VaultError::provider(format!(
                "no trade aggregates for {pair} in {}",
                path.display()
            )));
        }
        records.sort_by_key(|r| r.timestamp_ms);

        if let Some(pair_of_rows) = records
            .windows(2)
            .find(|w| w[1].timestamp_ms - w[0].timestamp_ms < resolution_ms)
        {
            return Err(VaultError::provider(format!(
                "{} has rows at {} and {}, finer than the {}ms resolution",
                path.display(),
                pair_of_rows[0].timestamp_ms,
                pair_of_rows[1].timestamp_ms,
                resolution_ms
            )));
        }
        Ok(records)
    }
}
