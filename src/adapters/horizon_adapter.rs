//! Horizon trade aggregation adapter.
//!
//! Fetches one page of OHLCV buckets from `{url}/trade_aggregations`. Horizon
//! encodes most numeric fields as JSON strings, older servers as numbers, so
//! both are accepted.
//!
//! Pagination is not followed. A full page over a window with more buckets
//! than the limit is logged as truncated; the gap filler then carries the last
//! returned close forward over the rest of the window.

use crate::domain::error::VaultError;
use crate::domain::gap_fill::bucket_count;
use crate::domain::price::{AggregateRecord, AssetId, AssetPair, TimeWindow};
use crate::ports::aggregate_port::AggregatePort;
use crate::ports::config_port::ConfigPort;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const DEFAULT_LIMIT: u32 = 200;
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
struct AggregationPage {
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    records: Vec<RawAggregate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    fn parse<T: FromStr>(&self, field: &str) -> Result<T, VaultError> {
        let text = match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.clone(),
        };
        text.parse()
            .map_err(|_| VaultError::provider(format!("invalid {field} value '{text}'")))
    }
}

#[derive(Debug, Deserialize)]
struct RawAggregate {
    timestamp: Numeric,
    trade_count: Numeric,
    base_volume: Numeric,
    counter_volume: Numeric,
    avg: Numeric,
    high: Numeric,
    low: Numeric,
    open: Numeric,
    close: Numeric,
}

impl TryFrom<RawAggregate> for AggregateRecord {
    type Error = VaultError;

    fn try_from(raw: RawAggregate) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp_ms: raw.timestamp.parse("timestamp")?,
            trade_count: raw.trade_count.parse("trade_count")?,
            base_volume: raw.base_volume.parse("base_volume")?,
            counter_volume: raw.counter_volume.parse("counter_volume")?,
            avg: raw.avg.parse("avg")?,
            high: raw.high.parse("high")?,
            low: raw.low.parse("low")?,
            open: raw.open.parse("open")?,
            close: raw.close.parse("close")?,
        })
    }
}

pub struct HorizonAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    limit: u32,
}

impl HorizonAdapter {
    /// `timeout` of `None` leaves the request unbounded.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        limit: u32,
    ) -> Result<Self, VaultError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VaultError::provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit: limit.clamp(1, MAX_LIMIT),
        })
    }

    /// Reads `[horizon] url, timeout_secs, limit`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VaultError> {
        let url = config
            .get_string("horizon", "url")
            .unwrap_or_else(|| DEFAULT_HORIZON_URL.to_string());
        let timeout_secs = config.get_int("horizon", "timeout_secs", 0);
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs as u64));
        let limit = config.get_int("horizon", "limit", i64::from(DEFAULT_LIMIT));
        let limit = u32::try_from(limit).unwrap_or(DEFAULT_LIMIT);
        Self::new(url, timeout, limit)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// A page holding exactly `limit` records for a window with more buckets
    /// than that means later buckets were cut off.
    pub fn is_truncated(&self, returned: usize, window: TimeWindow, resolution_ms: i64) -> bool {
        let limit = self.limit as usize;
        returned >= limit && bucket_count(window.start_ms, window.end_ms, resolution_ms) > limit
    }

    fn endpoint(&self) -> String {
        format!("{}/trade_aggregations", self.base_url)
    }

    fn query_params(
        &self,
        pair: &AssetPair,
        window: TimeWindow,
        resolution_ms: i64,
    ) -> Result<Vec<(String, String)>, VaultError> {
        let mut params = Vec::with_capacity(12);
        push_asset(&mut params, "base", &pair.base)?;
        push_asset(&mut params, "counter", &pair.counter)?;
        params.push(("start_time".into(), window.start_ms.to_string()));
        params.push(("end_time".into(), window.end_ms.to_string()));
        params.push(("resolution".into(), resolution_ms.to_string()));
        params.push(("limit".into(), self.limit.to_string()));
        params.push(("order".into(), "asc".into()));
        Ok(params)
    }
}

/// Horizon asset type for a code: `native`, or alphanum4/12 by code length.
pub fn asset_type(asset: &AssetId) -> &'static str {
    if asset.is_native() {
        "native"
    } else if asset.code.len() <= 4 {
        "credit_alphanum4"
    } else {
        "credit_alphanum12"
    }
}

fn push_asset(
    params: &mut Vec<(String, String)>,
    side: &str,
    asset: &AssetId,
) -> Result<(), VaultError> {
    let kind = asset_type(asset);
    params.push((format!("{side}_asset_type"), kind.to_string()));
    if asset.is_native() {
        return Ok(());
    }
    let issuer = asset
        .issuer
        .as_ref()
        .ok_or_else(|| VaultError::provider(format!("{side} asset {} has no issuer", asset.code)))?;
    params.push((format!("{side}_asset_code"), asset.code.clone()));
    params.push((format!("{side}_asset_issuer"), issuer.clone()));
    Ok(())
}

fn parse_page(pair: &AssetPair, page: AggregationPage) -> Result<Vec<AggregateRecord>, VaultError> {
    let records = page
        .embedded
        .records
        .into_iter()
        .map(AggregateRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(VaultError::provider(format!(
            "no trade aggregates for {pair}"
        )));
    }
    Ok(records)
}

impl AggregatePort for HorizonAdapter {
    fn fetch_aggregates(
        &self,
        pair: &AssetPair,
        window: TimeWindow,
        resolution_ms: i64,
    ) -> Result<Vec<AggregateRecord>, VaultError> {
        let params = self.query_params(pair, window, resolution_ms)?;
        log::debug!("GET {} for {pair}", self.endpoint());

        let resp = self
            .client
            .get(self.endpoint())
            .query(&params)
            .send()
            .map_err(|e| VaultError::provider(format!("request for {pair} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VaultError::provider(format!("HTTP {status} for {pair}")));
        }

        let page: AggregationPage = resp.json().map_err(|e| {
            VaultError::provider(format!("failed to parse response for {pair}: {e}"))
        })?;
        let records = parse_page(pair, page)?;
        if self.is_truncated(records.len(), window, resolution_ms) {
            let last = records.last().map_or(window.start_ms, |r| r.timestamp_ms);
            log::warn!(
                "{pair}: page truncated at {} records (last bucket {last}); later buckets are carried forward",
                self.limit
            );
        }
        Ok(records)
    }
}
