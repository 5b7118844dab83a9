//! Historical price reconstruction: normalize, fetch, convert, gap-fill, and
//! fall back to a synthetic series when the provider has nothing usable.

use crate::domain::gap_fill;
use crate::domain::price::{
    DataSource, HistoricalDataRequest, HistoricalDataResponse, PricePoint,
};
use crate::domain::resolution;
use crate::domain::synthetic::SyntheticSeriesGenerator;
use crate::ports::aggregate_port::AggregatePort;

/// Never fails. Provider errors are logged and replaced by synthetic data,
/// flagged through `data_source` and `using_mock_data`.
pub fn load_price_history(
    port: &dyn AggregatePort,
    generator: &SyntheticSeriesGenerator,
    request: &HistoricalDataRequest,
) -> HistoricalDataResponse {
    let resolution_ms = resolution::normalize(request.resolution_ms);
    if resolution_ms != request.resolution_ms {
        log::debug!(
            "resolution {}ms snapped to {}ms",
            request.resolution_ms,
            resolution_ms
        );
    }
    let window = request.window();

    let fallback_reason = match port.fetch_aggregates(&request.pair, window, resolution_ms) {
        Ok(records) if records.is_empty() => "no trade aggregates returned".to_string(),
        Ok(records) => {
            let mut points: Vec<PricePoint> =
                records.iter().filter_map(PricePoint::from_aggregate).collect();
            points.sort_by_key(PricePoint::timestamp_ms);
            let filled =
                gap_fill::fill(&points, window.start_ms, window.end_ms, resolution_ms);
            if !filled.is_empty() {
                log::debug!(
                    "{}: {} aggregates filled to {} points",
                    request.pair,
                    records.len(),
                    filled.len()
                );
                return HistoricalDataResponse {
                    resolution_ms,
                    data_points: filled,
                    data_source: DataSource::StellarDex,
                    using_mock_data: false,
                };
            }
            "aggregates did not cover the requested window".to_string()
        }
        Err(e) => e.to_string(),
    };

    log::warn!(
        "{}: {fallback_reason}; using synthetic prices (seed {})",
        request.pair,
        generator.seed()
    );
    HistoricalDataResponse {
        resolution_ms,
        data_points: generator.generate(
            &request.pair.base.code,
            window.start_ms,
            window.end_ms,
            resolution_ms,
        ),
        data_source: DataSource::MockData,
        using_mock_data: true,
    }
}
