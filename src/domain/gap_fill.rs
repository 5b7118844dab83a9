//! Gap filling: turn sparse aggregate points into a regularly spaced series.
//!
//! Buckets run from `start_ms` to `end_ms` inclusive in steps of
//! `resolution_ms`. For each bucket time `t`:
//!
//! - a raw point with `|ts - t| < resolution / 2` is emitted verbatim (the
//!   earliest such point when several qualify);
//! - otherwise, if a point was already emitted and a raw point exists after `t`,
//!   a flat point at the mean of their closes is emitted with zero volume;
//! - otherwise, if a point was already emitted, it is carried forward with the
//!   bucket's timestamp;
//! - otherwise (leading gap) nothing is emitted, so the output can be shorter
//!   than the nominal bucket count.

use crate::domain::price::PricePoint;
use chrono::DateTime;

/// Nominal number of buckets in `[start_ms, end_ms]`.
pub fn bucket_count(start_ms: i64, end_ms: i64, resolution_ms: i64) -> usize {
    if resolution_ms <= 0 || end_ms < start_ms {
        return 0;
    }
    ((end_ms - start_ms) / resolution_ms) as usize + 1
}

pub fn fill(
    points: &[PricePoint],
    start_ms: i64,
    end_ms: i64,
    resolution_ms: i64,
) -> Vec<PricePoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let capacity = bucket_count(start_ms, end_ms, resolution_ms);
    if capacity == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&PricePoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.timestamp_ms());

    let mut filled: Vec<PricePoint> = Vec::with_capacity(capacity);
    let mut t = start_ms;
    while t <= end_ms {
        let Some(bucket_time) = DateTime::from_timestamp_millis(t) else {
            break;
        };

        if let Some(existing) = nearest(&sorted, t, resolution_ms) {
            filled.push(existing.clone());
        } else if let Some(prev) = filled.last() {
            let after = sorted.partition_point(|p| p.timestamp_ms() <= t);
            let point = match sorted.get(after) {
                Some(next) => PricePoint::flat(bucket_time, (prev.close + next.close) / 2.0),
                None => prev.with_timestamp(bucket_time),
            };
            filled.push(point);
        }

        t = match t.checked_add(resolution_ms) {
            Some(next) => next,
            None => break,
        };
    }

    filled
}

/// Earliest point strictly within half a resolution of `t`.
fn nearest<'a>(sorted: &[&'a PricePoint], t: i64, resolution_ms: i64) -> Option<&'a PricePoint> {
    let res = i128::from(resolution_ms);
    let offset = |p: &PricePoint| (i128::from(p.timestamp_ms()) - i128::from(t)) * 2;
    let first = sorted.partition_point(|p| offset(*p) <= -res);
    sorted.get(first).copied().filter(|p| offset(*p) < res)
}
