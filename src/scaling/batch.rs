// =============================================================================
// Batch Estimator — per-instrument isolation over many series
// =============================================================================
//
// Every instrument arrives with the outcome of its fetch. Fetch failures and
// pipeline failures are both terminal for that instrument in this run and are
// recorded with their kind; the remaining instruments are unaffected.
//
// Instruments are independent, so they are evaluated on the rayon pool.
// `collect` on an indexed parallel iterator keeps input order, which keeps the
// success and failure listings reproducible.
// =============================================================================

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::errors::{EstimateError, FailureKind};
use crate::scaling::ladder::ScaleLadder;
use crate::scaling::runner::{Estimate, InstrumentRunner};
use crate::types::DeltaSeries;

/// Input to the batch: instrument id and the result of fetching its deltas.
pub type BatchInput = (String, Result<DeltaSeries, EstimateError>);

/// Ordered mapping instrument id → fitted slope. Serializes as a flat JSON
/// object in insertion order. Ids are unique: re-inserting an id replaces its
/// slope in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    slopes: Vec<(String, f64)>,
}

impl BatchResult {
    /// Record `slope` for `id`. Returns the slope it replaced, if any.
    pub fn insert(&mut self, id: impl Into<String>, slope: f64) -> Option<f64> {
        let id = id.into();
        match self.slopes.iter_mut().find(|(k, _)| *k == id) {
            Some((_, existing)) => {
                let previous = *existing;
                warn!(instrument = %id, previous, slope, "duplicate instrument id, slope replaced");
                *existing = slope;
                Some(previous)
            }
            None => {
                self.slopes.push((id, slope));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.slopes.iter().find(|(k, _)| k == id).map(|&(_, v)| v)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slopes.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.slopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slopes.is_empty()
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slopes.len()))?;
        for (id, slope) in &self.slopes {
            map.serialize_entry(id, slope)?;
        }
        map.end()
    }
}

/// One instrument that produced no slope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentFailure {
    pub id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub result: BatchResult,
    pub failures: Vec<InstrumentFailure>,
    /// Full estimates for successful instruments, input order. Consumed by
    /// profile observers.
    pub estimates: Vec<(String, Estimate)>,
}

/// Runs [`InstrumentRunner`] over a set of instruments.
pub struct BatchEstimator {
    ladder: ScaleLadder,
}

impl BatchEstimator {
    pub fn new(ladder: ScaleLadder) -> Self {
        Self { ladder }
    }

    pub fn ladder(&self) -> &ScaleLadder {
        &self.ladder
    }

    /// Estimate every instrument, isolating failures.
    pub fn run_batch(&self, inputs: Vec<BatchInput>) -> BatchReport {
        let total = inputs.len();

        let outcomes: Vec<(String, Result<Estimate, EstimateError>)> = inputs
            .into_par_iter()
            .map(|(id, fetched)| {
                let outcome =
                    fetched.and_then(|series| InstrumentRunner::estimate(&series, &self.ladder));
                (id, outcome)
            })
            .collect();

        let mut report = BatchReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(estimate) => {
                    info!(
                        instrument = %id,
                        slope = format!("{:.4}", estimate.fit.slope),
                        points = estimate.fit.points,
                        "scaling exponent estimated"
                    );
                    report.result.insert(id.clone(), estimate.fit.slope);
                    report.estimates.push((id, estimate));
                }
                Err(e) => {
                    warn!(instrument = %id, kind = %e.kind(), error = %e, "instrument failed");
                    report.failures.push(InstrumentFailure {
                        id,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            total,
            succeeded = report.result.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeltaPoint;

    fn ramp_series(len: usize, seed: u64) -> DeltaSeries {
        let mut state = seed;
        DeltaSeries::from_points((0..len).map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            DeltaPoint {
                timestamp_ms: i as i64 * 60_000,
                value: (state % 1000) as f64 / 1000.0,
            }
        }))
    }

    fn estimator() -> BatchEstimator {
        BatchEstimator::new(ScaleLadder::linear(6).unwrap())
    }

    #[test]
    fn failure_is_isolated_and_order_preserved() {
        let inputs = vec![
            ("AAA".to_string(), Ok(ramp_series(300, 1))),
            (
                "BBB".to_string(),
                Err(EstimateError::DataSource("connection reset".into())),
            ),
            ("CCC".to_string(), Ok(ramp_series(300, 2))),
        ];

        let report = estimator().run_batch(inputs);

        assert_eq!(report.result.ids().collect::<Vec<_>>(), vec!["AAA", "CCC"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "BBB");
        assert_eq!(report.failures[0].kind, FailureKind::DataSource);
        assert_eq!(report.estimates.len(), 2);
        assert_eq!(report.estimates[1].0, "CCC");
    }

    #[test]
    fn pipeline_failures_are_recorded_with_kind() {
        let inputs = vec![
            ("EMPTY".to_string(), Ok(DeltaSeries::default())),
            ("OK".to_string(), Ok(ramp_series(200, 3))),
            (
                "ONE".to_string(),
                Ok(DeltaSeries::from_points([DeltaPoint { timestamp_ms: 0, value: 1.0 }])),
            ),
        ];

        let report = estimator().run_batch(inputs);

        let kinds: Vec<_> = report.failures.iter().map(|f| (f.id.as_str(), f.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("EMPTY", FailureKind::EmptySeries),
                ("ONE", FailureKind::InsufficientData)
            ]
        );
        assert!(report.result.get("OK").is_some());
    }

    #[test]
    fn many_instruments_keep_input_order() {
        let inputs: Vec<BatchInput> = (0..32)
            .map(|i| (format!("I{i:02}"), Ok(ramp_series(120, i + 1))))
            .collect();
        let report = estimator().run_batch(inputs);
        let ids: Vec<String> = report.result.ids().map(str::to_string).collect();
        let expected: Vec<String> = (0..32).map(|i| format!("I{i:02}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn batch_result_serialises_as_flat_ordered_object() {
        let result = BatchResult {
            slopes: vec![("ZZZ".into(), 0.5), ("AAA".into(), 0.25)],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"ZZZ":0.5,"AAA":0.25}"#);
    }

    #[test]
    fn duplicate_ids_keep_one_key_in_output() {
        let first = ramp_series(300, 4);
        let second = ramp_series(300, 5);
        let expected = InstrumentRunner::estimate(&second, estimator().ladder())
            .unwrap()
            .fit
            .slope;

        let inputs = vec![
            ("SBER".to_string(), Ok(first)),
            ("GAZP".to_string(), Ok(ramp_series(300, 6))),
            ("SBER".to_string(), Ok(second)),
        ];
        let report = estimator().run_batch(inputs);

        assert_eq!(report.result.len(), 2);
        assert_eq!(report.result.ids().collect::<Vec<_>>(), vec!["SBER", "GAZP"]);
        assert_eq!(report.result.get("SBER"), Some(expected));

        let json = serde_json::to_string(&report.result).unwrap();
        let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), report.result.len());
        assert_eq!(json.matches("\"SBER\"").count(), 1);
    }

    #[test]
    fn insert_replaces_existing_slope() {
        let mut result = BatchResult::default();
        assert_eq!(result.insert("A", 0.4), None);
        assert_eq!(result.insert("A", 0.6), Some(0.4));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("A"), Some(0.6));
    }

    #[test]
    fn empty_batch_is_empty_report() {
        let report = estimator().run_batch(Vec::new());
        assert!(report.result.is_empty());
        assert!(report.failures.is_empty());
    }
}
