//! Snapping requested resolutions to the bucket sizes the aggregation
//! endpoint accepts. Normalize before fetching.

pub const MINUTE_MS: i64 = 60_000;
pub const FIVE_MINUTES_MS: i64 = 5 * MINUTE_MS;
pub const FIFTEEN_MINUTES_MS: i64 = 15 * MINUTE_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;

/// Supported bucket sizes, ascending.
pub const SUPPORTED_RESOLUTIONS: [i64; 6] = [
    MINUTE_MS,
    FIVE_MINUTES_MS,
    FIFTEEN_MINUTES_MS,
    HOUR_MS,
    DAY_MS,
    WEEK_MS,
];

/// Nearest supported resolution. On a tie the first (smaller) bucket wins.
pub fn normalize(requested_ms: i64) -> i64 {
    let mut best = SUPPORTED_RESOLUTIONS[0];
    for &candidate in &SUPPORTED_RESOLUTIONS[1..] {
        if requested_ms.abs_diff(candidate) < requested_ms.abs_diff(best) {
            best = candidate;
        }
    }
    best
}

pub fn is_supported(resolution_ms: i64) -> bool {
    SUPPORTED_RESOLUTIONS.contains(&resolution_ms)
}
