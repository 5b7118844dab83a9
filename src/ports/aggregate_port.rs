//! Trade aggregate source port.

use crate::domain::error::VaultError;
use crate::domain::price::{AggregateRecord, AssetPair, TimeWindow};

pub trait AggregatePort {
    /// Fetch OHLCV buckets for `pair` inside `window`.
    ///
    /// `resolution_ms` must already be a supported bucket size. Implementations
    /// return `VaultError::Provider` when the source fails or has no records;
    /// they never fall back to synthetic data themselves.
    fn fetch_aggregates(
        &self,
        pair: &AssetPair,
        window: TimeWindow,
        resolution_ms: i64,
    ) -> Result<Vec<AggregateRecord>, VaultError>;
}
