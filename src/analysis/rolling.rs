// =============================================================================
// Rolling Window Statistics — mean / median / std of raw deltas
// =============================================================================
//
// Each output point summarises the last `window` observations up to and
// including itself. The first points use whatever history exists (a minimum
// of one observation), so the output is as long as the input. The standard
// deviation needs two observations and is `None` until then.

use serde::Serialize;

use crate::scaling::dispersion::sample_std_dev;
use crate::types::DeltaSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub timestamp_ms: i64,
    pub value: f64,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
}

/// Rolling statistics over `window` observations. Empty when `window == 0`.
pub fn rolling_stats(series: &DeltaSeries, window: usize) -> Vec<RollingPoint> {
    if window == 0 {
        return Vec::new();
    }

    let points = series.points();
    let values = series.values();

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let slice = &values[(i + 1).saturating_sub(window)..=i];
            RollingPoint {
                timestamp_ms: p.timestamp_ms,
                value: p.value,
                mean: slice.iter().sum::<f64>() / slice.len() as f64,
                median: median(slice),
                std: sample_std_dev(slice),
            }
        })
        .collect()
}

/// Median of a non-empty slice.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
