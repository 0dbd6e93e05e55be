// =============================================================================
// Scale Aggregator — bucket sums of deltas per scale width
// =============================================================================
//
// For every width w in the ladder the series is cut into consecutive,
// non-overlapping buckets of w minutes and the deltas inside each bucket are
// summed.
//
// Alignment: bucket boundaries are calendar-aligned. The origin is UTC
// midnight of the day holding the first observation and every boundary sits
// at origin + k*w. An observation at time t lands in bucket
//
//   origin + floor((t - origin) / w) * w
//
// so every observation is counted exactly once and the bucket sums always add
// up to the series total.
//
// Buckets with no observations are omitted entirely. A synthetic zero would
// drag the standard deviation down.
// =============================================================================

use serde::Serialize;
use tracing::trace;

use crate::scaling::ladder::{width_ms, ScaleLadder};
use crate::types::DeltaSeries;

const DAY_MS: i64 = 86_400_000;

/// One non-empty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub start_ms: i64,
    pub sum: f64,
}

/// Sparse bucket sums for a single scale width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub width_minutes: u32,
    pub buckets: Vec<Bucket>,
}

impl AggregatedSeries {
    pub fn sums(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.sum).collect()
    }

    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.sum).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Aggregate `series` once per ladder width, in ladder order.
pub fn aggregate(series: &DeltaSeries, ladder: &ScaleLadder) -> Vec<AggregatedSeries> {
    ladder
        .widths()
        .iter()
        .map(|&w| aggregate_width(series, w))
        .collect()
}

/// Aggregate `series` into calendar-aligned buckets of `width_minutes`.
pub fn aggregate_width(series: &DeltaSeries, width_minutes: u32) -> AggregatedSeries {
    let points = series.points();
    let mut buckets: Vec<Bucket> = Vec::new();

    let Some(first) = points.first() else {
        return AggregatedSeries { width_minutes, buckets };
    };

    let origin = calendar_origin(first.timestamp_ms);
    let w = width_ms(width_minutes).max(1);

    for p in points {
        let start = origin + (p.timestamp_ms - origin).div_euclid(w) * w;
        match buckets.last_mut() {
            Some(b) if b.start_ms == start => b.sum += p.value,
            _ => buckets.push(Bucket { start_ms: start, sum: p.value }),
        }
    }

    trace!(
        width_minutes,
        observations = points.len(),
        buckets = buckets.len(),
        "aggregated deltas"
    );

    AggregatedSeries { width_minutes, buckets }
}

/// UTC midnight of the day containing `ts_ms`.
fn calendar_origin(ts_ms: i64) -> i64 {
    ts_ms - ts_ms.rem_euclid(DAY_MS)
}
