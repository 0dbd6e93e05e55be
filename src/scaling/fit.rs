// =============================================================================
// Scaling Exponent Fitter — OLS in log-log space
// =============================================================================
//
//   ln σ(Δt) = intercept + slope * ln Δt
//
// slope = Σ((x-x̄)(y-ȳ)) / Σ((x-x̄)²),  intercept = ȳ - slope * x̄
//
// The slope is the scaling exponent (≈ 0.5 for a random walk). Pairs with a
// non-positive or non-finite scale or dispersion are discarded before the
// logarithm is taken, so the fit never produces ±∞.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::errors::EstimateError;

/// Result of the log-log regression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitResult {
    /// Estimated scaling exponent.
    pub slope: f64,
    /// ln of the multiplicative constant.
    pub intercept: f64,
    /// Number of (scale, dispersion) pairs used.
    pub points: usize,
}

impl FitResult {
    /// Dispersion predicted by the fitted power law at `scale`.
    pub fn predict(&self, scale: f64) -> f64 {
        (self.intercept + self.slope * scale.ln()).exp()
    }
}

/// Fit `ln(dispersion)` against `ln(scale)` by ordinary least squares.
///
/// Fails with [`EstimateError::InsufficientData`] when the slices differ in
/// length, when fewer than two valid pairs remain, or when they span fewer
/// than two distinct scales.
pub fn fit(scales: &[f64], dispersions: &[f64]) -> Result<FitResult, EstimateError> {
    if scales.len() != dispersions.len() {
        warn!(
            scales = scales.len(),
            dispersions = dispersions.len(),
            "fit: scale and dispersion counts differ"
        );
        return Err(EstimateError::InsufficientData { usable: 0, distinct: 0 });
    }

    let (log_x, log_y): (Vec<f64>, Vec<f64>) = scales
        .iter()
        .zip(dispersions)
        .filter(|(&s, &d)| s > 0.0 && s.is_finite() && d > 0.0 && d.is_finite())
        .map(|(&s, &d)| (s.ln(), d.ln()))
        .unzip();

    let discarded = scales.len() - log_x.len();
    if discarded > 0 {
        debug!(discarded, "fit: discarded non-positive or non-finite pairs");
    }

    let usable = log_x.len();
    let distinct = count_distinct(&log_x);
    if usable < 2 || distinct < 2 {
        trace!(usable, distinct, "fit: insufficient data");
        return Err(EstimateError::InsufficientData { usable, distinct });
    }

    let n = usable as f64;
    let x_mean = log_x.iter().sum::<f64>() / n;
    let y_mean = log_y.iter().sum::<f64>() / n;

    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    for (x, y) in log_x.iter().zip(&log_y) {
        let dx = x - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    trace!(
        slope = format!("{:.4}", slope),
        intercept = format!("{:.4}", intercept),
        points = usable,
        "power law fitted"
    );

    Ok(FitResult {
        slope,
        intercept,
        points: usable,
    })
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power_law(c: f64, h: f64, scales: &[f64]) -> Vec<f64> {
        scales.iter().map(|s| c * s.powf(h)).collect()
    }

    #[test]
    fn recovers_known_slope_and_intercept() {
        let scales: Vec<f64> = (1..=12).map(f64::from).collect();
        for &(c, h) in &[(0.37, 0.5), (2.5, 0.81), (11.0, 0.12), (0.05, 1.3)] {
            let disps = power_law(c, h, &scales);
            let f = fit(&scales, &disps).unwrap();
            assert!((f.slope - h).abs() < 1e-10, "slope {} != {h}", f.slope);
            assert!((f.intercept - c.ln()).abs() < 1e-10);
            assert_eq!(f.points, 12);
        }
    }

    #[test]
    fn recovers_slope_on_dyadic_scales() {
        let scales: Vec<f64> = (1..=8).map(|i| 2f64.powi(i)).collect();
        let f = fit(&scales, &power_law(1.7, 0.42, &scales)).unwrap();
        assert!((f.slope - 0.42).abs() < 1e-10);
        assert!((f.predict(64.0) - 1.7 * 64f64.powf(0.42)).abs() < 1e-9);
    }

    #[test]
    fn rejects_single_distinct_scale() {
        let err = fit(&[4.0, 4.0, 4.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, EstimateError::InsufficientData { usable: 3, distinct: 1 });
    }

    #[test]
    fn rejects_fewer_than_two_pairs() {
        assert!(matches!(
            fit(&[1.0], &[1.0]),
            Err(EstimateError::InsufficientData { usable: 1, .. })
        ));
        assert!(matches!(
            fit(&[], &[]),
            Err(EstimateError::InsufficientData { usable: 0, .. })
        ));
    }

    #[test]
    fn zero_and_nan_dispersions_are_discarded_not_logged() {
        let f = fit(&[1.0, 2.0, 3.0, 4.0], &[1.0, 0.0, f64::NAN, 2.0]).unwrap();
        assert_eq!(f.points, 2);
        assert!(f.slope.is_finite());
        assert!((f.slope - 0.5).abs() < 1e-12);

        let err = fit(&[1.0, 2.0], &[0.0, 3.0]).unwrap_err();
        assert!(matches!(err, EstimateError::InsufficientData { usable: 1, .. }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let scales = [1.0, 2.0, 3.0];
        let err = fit(&scales, &power_law(1.0, 0.5, &scales[..2])).unwrap_err();
        assert_eq!(err, EstimateError::InsufficientData { usable: 0, distinct: 0 });
        assert!(fit(&scales[..2], &power_law(1.0, 0.5, &scales)).is_err());
    }

    #[test]
    fn determinism() {
        let scales = [1.0, 2.0, 3.0, 5.0, 8.0];
        let disps = [0.9, 1.4, 1.6, 2.3, 2.7];
        assert_eq!(fit(&scales, &disps), fit(&scales, &disps));
    }
}
