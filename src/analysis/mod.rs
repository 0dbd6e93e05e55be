// =============================================================================
// Delta Analysis Module
// =============================================================================
//
// Single-scale views of raw deltas that complement the multi-scale estimate:
// - rolling mean / median / std over a fixed observation window
// - distribution of delta magnitudes as an equal-width histogram

pub mod histogram;
pub mod rolling;

use tracing::{info, warn};

use crate::types::DeltaSeries;

pub use histogram::{shared_range, Histogram};
pub use rolling::{rolling_stats, RollingPoint};

/// Log the latest rolling statistics of `series`. Returns the full rolling
/// series so callers can forward it to a renderer.
pub fn log_rolling_summary(instrument: &str, series: &DeltaSeries, window: usize) -> Vec<RollingPoint> {
    let stats = rolling_stats(series, window);
    match stats.last() {
        Some(last) => info!(
            instrument,
            window,
            observations = stats.len(),
            delta = format!("{:.6}", last.value),
            mean = format!("{:.6}", last.mean),
            median = format!("{:.6}", last.median),
            std = last.std.map(|s| format!("{:.6}", s)).unwrap_or_else(|| "n/a".into()),
            "rolling window analysis"
        ),
        None => warn!(instrument, window, "rolling window analysis: no data"),
    }
    stats
}

/// Log the histogram of every series in `batch` over one shared set of
/// `bins` bins, so the distributions are directly comparable. Returns the
/// histograms in input order; empty series are skipped.
pub fn log_distributions<'a>(
    batch: impl IntoIterator<Item = (&'a str, &'a DeltaSeries)>,
    bins: usize,
) -> Vec<(String, Histogram)> {
    let samples: Vec<(&str, Vec<f64>)> = batch
        .into_iter()
        .filter(|(_, series)| !series.is_empty())
        .map(|(name, series)| (name, series.values()))
        .collect();

    let Some((lower, upper)) = shared_range(samples.iter().map(|(_, v)| v.as_slice())) else {
        warn!(bins, "distribution of deltas: no data");
        return Vec::new();
    };

    samples
        .iter()
        .filter_map(|(instrument, values)| {
            let hist = Histogram::with_range(values, bins, lower, upper)?;
            log_histogram(instrument, &hist);
            Some((instrument.to_string(), hist))
        })
        .collect()
}

fn log_histogram(instrument: &str, hist: &Histogram) {
    info!(
        instrument,
        observations = hist.total(),
        lower = format!("{:.6}", hist.lower),
        upper = format!("{:.6}", hist.upper),
        bin_width = format!("{:.6}", hist.bin_width()),
        mode_bin_start = format!("{:.6}", hist.edges()[hist.mode_bin()]),
        "distribution of deltas"
    );
    for (edge, count) in hist.edges().iter().zip(&hist.counts).filter(|(_, &c)| c > 0) {
        info!(instrument, bin_start = format!("{:.6}", edge), count, "delta bin");
    }
}
