// =============================================================================
// Delta Histogram — equal-width bins over the observed range
// =============================================================================
//
// Bins span [min, max] of the finite values; the last bin is closed on the
// right so the maximum is counted. A constant sample is widened to
// [v - 0.5, v + 0.5] so the bins still have positive width.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Build a histogram with `bins` bins over the sample's own range. `None`
    /// when `bins == 0` or no finite value is present.
    pub fn build(values: &[f64], bins: usize) -> Option<Self> {
        let (lower, upper) = shared_range([values])?;
        Self::with_range(values, bins, lower, upper)
    }

    /// Build a histogram with `bins` bins spanning `[lower, upper]`. Values
    /// outside the range are not counted. `None` when `bins == 0` or the range
    /// is empty or non-finite.
    pub fn with_range(values: &[f64], bins: usize, lower: f64, upper: f64) -> Option<Self> {
        if bins == 0 || !lower.is_finite() || !upper.is_finite() || upper <= lower {
            return None;
        }

        let width = (upper - lower) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &v in values.iter().filter(|v| v.is_finite()) {
            if v < lower || v > upper {
                continue;
            }
            let idx = (((v - lower) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Self { lower, upper, counts })
    }

    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// Left edge of every bin.
    pub fn edges(&self) -> Vec<f64> {
        let w = self.bin_width();
        (0..self.counts.len()).map(|i| self.lower + w * i as f64).collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Index of the most populated bin (first on ties).
    pub fn mode_bin(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best })
            .0
    }
}

/// Range covering every finite value across `samples`, so that histograms
/// built on it share bin edges. `None` when no sample has a finite value.
pub fn shared_range<'a>(samples: impl IntoIterator<Item = &'a [f64]>) -> Option<(f64, f64)> {
    let (mut lower, mut upper) = samples
        .into_iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;
    if upper <= lower {
        lower -= 0.5;
        upper += 0.5;
    }
    Some((lower, upper))
}
