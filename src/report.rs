// =============================================================================
// Profile Report — rendering seam for per-instrument scaling profiles
// =============================================================================
//
// Observers receive the ladder, the dispersion profile and the fitted law of
// each successful instrument after the batch has finished. They only read;
// the batch result is identical whether or not any observer runs.

use tracing::info;

use crate::scaling::{BatchReport, DispersionProfile, FitResult, ScaleLadder};

/// Consumer of per-instrument scaling profiles.
pub trait ProfileObserver {
    fn observe(&mut self, instrument: &str, ladder: &ScaleLadder, profile: &DispersionProfile, fit: &FitResult);
}

/// Feed every successful estimate of `report` to `observer`, in input order.
pub fn render_all(report: &BatchReport, ladder: &ScaleLadder, observer: &mut dyn ProfileObserver) {
    for (id, estimate) in &report.estimates {
        observer.observe(id, ladder, &estimate.profile, &estimate.fit);
    }
}

/// Writes σ(Δt) and the fitted σ̂(Δt) per scale as structured log lines.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProfileObserver for LogReporter {
    fn observe(&mut self, instrument: &str, _ladder: &ScaleLadder, profile: &DispersionProfile, fit: &FitResult) {
        for &(width, sigma) in &profile.entries {
            match sigma {
                Some(sigma) => info!(
                    instrument,
                    dt_min = width,
                    sigma = format!("{:.6}", sigma),
                    fitted = format!("{:.6}", fit.predict(f64::from(width))),
                    "σ(Δt)"
                ),
                None => info!(instrument, dt_min = width, "σ(Δt) undefined"),
            }
        }
        info!(
            instrument,
            slope = format!("{:.2}", fit.slope),
            intercept = format!("{:.4}", fit.intercept),
            "log-log linear approximation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EstimateError;
    use crate::scaling::BatchEstimator;
    use crate::types::{DeltaPoint, DeltaSeries};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, usize, f64)>,
    }

    impl ProfileObserver for Recorder {
        fn observe(&mut self, instrument: &str, ladder: &ScaleLadder, profile: &DispersionProfile, fit: &FitResult) {
            assert_eq!(ladder.len(), profile.len());
            self.seen.push((instrument.to_string(), profile.len(), fit.slope));
        }
    }

    fn series(seed: u64) -> DeltaSeries {
        let mut state = seed;
        DeltaSeries::from_points((0..180).map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            DeltaPoint {
                timestamp_ms: i * 60_000,
                value: (state % 100) as f64 / 10.0,
            }
        }))
    }

    #[test]
    fn observer_sees_successes_in_order_and_does_not_alter_result() {
        let ladder = ScaleLadder::linear(6).unwrap();
        let estimator = BatchEstimator::new(ladder.clone());
        let inputs = || {
            vec![
                ("A".to_string(), Ok(series(1))),
                ("B".to_string(), Err(EstimateError::EmptySeries)),
                ("C".to_string(), Ok(series(2))),
            ]
        };

        let report = estimator.run_batch(inputs());
        let before = report.result.clone();

        let mut rec = Recorder::default();
        render_all(&report, &ladder, &mut rec);
        render_all(&report, &ladder, &mut LogReporter);

        assert_eq!(rec.seen.len(), 2);
        assert_eq!(rec.seen[0].0, "A");
        assert_eq!(rec.seen[1].0, "C");
        assert_eq!(Some(rec.seen[1].2), report.result.get("C"));
        assert_eq!(report.result, before);
        assert_eq!(estimator.run_batch(inputs()).result, before);
    }
}
