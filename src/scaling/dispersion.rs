// =============================================================================
// Dispersion Estimator — sample standard deviation of bucket sums
// =============================================================================

use serde::Serialize;

use crate::scaling::aggregate::AggregatedSeries;

/// Sample standard deviation (divisor n - 1) of the finite values in `values`.
///
/// Returns `None` when fewer than two finite values are present. Undefined is
/// never reported as zero.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return None;
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();

    std.is_finite().then_some(std)
}

/// Dispersion of one aggregated series.
pub fn dispersion(series: &AggregatedSeries) -> Option<f64> {
    sample_std_dev(&series.sums())
}

/// Dispersion per scale width, in ladder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionProfile {
    pub entries: Vec<(u32, Option<f64>)>,
}

impl DispersionProfile {
    pub fn from_aggregates(aggregates: &[AggregatedSeries]) -> Self {
        Self {
            entries: aggregates
                .iter()
                .map(|a| (a.width_minutes, dispersion(a)))
                .collect(),
        }
    }

    /// Scale/dispersion pairs suitable for a log-log fit: defined, finite and
    /// strictly positive dispersions only.
    pub fn usable_pairs(&self) -> (Vec<f64>, Vec<f64>) {
        self.entries
            .iter()
            .filter_map(|&(w, d)| match d {
                Some(d) if d > 0.0 && d.is_finite() => Some((f64::from(w), d)),
                _ => None,
            })
            .unzip()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
