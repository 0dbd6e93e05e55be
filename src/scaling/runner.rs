// =============================================================================
// Instrument Runner — aggregate → disperse → fit for one series
// =============================================================================

use serde::Serialize;
use tracing::trace;

use crate::errors::EstimateError;
use crate::scaling::aggregate::aggregate;
use crate::scaling::dispersion::DispersionProfile;
use crate::scaling::fit::{fit, FitResult};
use crate::scaling::ladder::ScaleLadder;
use crate::types::DeltaSeries;

/// Dispersion profile and fitted power law of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub profile: DispersionProfile,
    pub fit: FitResult,
}

/// Stateless composition of the three pipeline stages.
pub struct InstrumentRunner;

impl InstrumentRunner {
    /// Fitted scaling law for `series` over `ladder`.
    pub fn run(series: &DeltaSeries, ladder: &ScaleLadder) -> Result<FitResult, EstimateError> {
        Self::estimate(series, ladder).map(|e| e.fit)
    }

    /// Like [`InstrumentRunner::run`] but also returns the dispersion profile.
    ///
    /// Fails with [`EstimateError::EmptySeries`] before any arithmetic when the
    /// series is empty; otherwise propagates the fitter's error unchanged.
    pub fn estimate(series: &DeltaSeries, ladder: &ScaleLadder) -> Result<Estimate, EstimateError> {
        if series.is_empty() {
            return Err(EstimateError::EmptySeries);
        }

        let aggregates = aggregate(series, ladder);
        let profile = DispersionProfile::from_aggregates(&aggregates);
        let (scales, dispersions) = profile.usable_pairs();

        trace!(
            observations = series.len(),
            scales = ladder.len(),
            usable = scales.len(),
            "dispersion profile built"
        );

        let fit = fit(&scales, &dispersions)?;
        Ok(Estimate { profile, fit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeltaPoint;

    const MIN: i64 = 60_000;

    /// Independent positive increments (|uniform noise|) one per minute. Their
    /// sums grow like a random walk so the scaling slope lands near 0.5.
    fn iid_deltas(len: usize, seed: u64) -> DeltaSeries {
        let mut state = seed;
        DeltaSeries::from_points((0..len).map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let r = (state as f64 / u64::MAX as f64) - 0.5;
            DeltaPoint {
                timestamp_ms: i as i64 * MIN,
                value: r.abs(),
            }
        }))
    }

    #[test]
    fn empty_series_fails_with_empty_series() {
        let ladder = ScaleLadder::linear(5).unwrap();
        assert_eq!(
            InstrumentRunner::run(&DeltaSeries::default(), &ladder),
            Err(EstimateError::EmptySeries)
        );
    }

    #[test]
    fn single_observation_is_insufficient_not_empty() {
        let ladder = ScaleLadder::linear(5).unwrap();
        let s = DeltaSeries::from_points([DeltaPoint { timestamp_ms: 0, value: 1.0 }]);
        assert!(matches!(
            InstrumentRunner::run(&s, &ladder),
            Err(EstimateError::InsufficientData { usable: 0, .. })
        ));
    }

    #[test]
    fn single_scale_ladder_is_insufficient() {
        let ladder = ScaleLadder::new(vec![1]).unwrap();
        let s = iid_deltas(100, 11);
        assert!(matches!(
            InstrumentRunner::run(&s, &ladder),
            Err(EstimateError::InsufficientData { usable: 1, distinct: 1 })
        ));
    }

    #[test]
    fn iid_deltas_scale_like_a_random_walk() {
        let s = iid_deltas(8_192, 123_456_789);
        let ladder = ScaleLadder::dyadic(6).unwrap();
        let e = InstrumentRunner::estimate(&s, &ladder).unwrap();
        assert_eq!(e.profile.len(), 6);
        assert_eq!(e.fit.points, 6);
        assert!(
            (0.3..=0.7).contains(&e.fit.slope),
            "slope should be broadly near 0.5, got {:.4}",
            e.fit.slope
        );
    }

    #[test]
    fn undefined_scales_are_skipped() {
        // 10 minutes of data: the 16-minute scale sees one bucket only.
        let s = iid_deltas(10, 5);
        let ladder = ScaleLadder::new(vec![1, 2, 16]).unwrap();
        let e = InstrumentRunner::estimate(&s, &ladder).unwrap();
        assert_eq!(e.profile.entries[2], (16, None));
        assert_eq!(e.fit.points, 2);
    }

    #[test]
    fn run_matches_estimate() {
        let s = iid_deltas(500, 99);
        let ladder = ScaleLadder::linear(8).unwrap();
        let fit = InstrumentRunner::run(&s, &ladder).unwrap();
        let est = InstrumentRunner::estimate(&s, &ladder).unwrap();
        assert_eq!(fit, est.fit);
    }
}
