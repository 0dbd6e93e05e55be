// =============================================================================
// Delta Source — market-data collaborator seam
// =============================================================================
//
// The estimation core never talks to the network. A `DeltaSource` turns an
// instrument id and a time window into a `DeltaSeries`, or fails with
// `EstimateError::DataSource`. `fetch_all` drives several fetches at once and
// hands the outcomes back in the order the instruments were listed.
// =============================================================================

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::EstimateError;
use crate::scaling::BatchInput;
use crate::types::{DeltaSeries, Instrument};

/// Time window and sampling interval requested from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub start_ms: i64,
    pub end_ms: i64,
    /// Native candle interval, e.g. "1m".
    pub interval: String,
}

impl FetchWindow {
    /// Window ending at `now` and reaching `lookback_minutes` into the past.
    pub fn trailing(now: DateTime<Utc>, lookback_minutes: i64, interval: impl Into<String>) -> Self {
        let start = now - Duration::minutes(lookback_minutes);
        Self {
            start_ms: start.timestamp_millis(),
            end_ms: now.timestamp_millis(),
            interval: interval.into(),
        }
    }
}

/// Provider of per-instrument delta series.
pub trait DeltaSource {
    fn fetch(
        &self,
        instrument_id: &str,
        window: &FetchWindow,
    ) -> impl Future<Output = Result<DeltaSeries, EstimateError>> + Send;
}

/// Fetch every instrument with at most `concurrency` requests in flight.
///
/// The returned inputs are keyed by display name and listed in the same order
/// as `instruments`, whatever order the requests complete in.
pub async fn fetch_all<S: DeltaSource>(
    source: &S,
    instruments: &[Instrument],
    window: &FetchWindow,
    concurrency: usize,
) -> Vec<BatchInput> {
    stream::iter(instruments)
        .map(|inst| async move {
            info!(instrument = %inst.display_name, id = %inst.id, "fetching deltas");
            let outcome = source.fetch(&inst.id, window).await;
            match &outcome {
                Ok(series) if series.is_empty() => {
                    warn!(instrument = %inst.display_name, "no data returned");
                }
                Ok(series) => {
                    info!(instrument = %inst.display_name, observations = series.len(), "deltas fetched");
                }
                Err(e) => {
                    warn!(instrument = %inst.display_name, error = %e, "fetch failed");
                }
            }
            (inst.display_name.clone(), outcome)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::{BatchEstimator, ScaleLadder};
    use crate::errors::FailureKind;
    use crate::types::DeltaPoint;
    use chrono::TimeZone;

    /// Deterministic in-memory source. Instruments listed in `failing` raise a
    /// data-source error; the rest get a synthetic minute series. Earlier
    /// instruments sleep longer so completion order differs from input order.
    struct StubSource {
        failing: Vec<&'static str>,
    }

    impl DeltaSource for StubSource {
        async fn fetch(
            &self,
            instrument_id: &str,
            window: &FetchWindow,
        ) -> Result<DeltaSeries, EstimateError> {
            let delay = match instrument_id {
                "ID1" => 30,
                "ID2" => 20,
                _ => 1,
            };
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

            if self.failing.iter().any(|f| *f == instrument_id) {
                return Err(EstimateError::DataSource(format!("{instrument_id}: 401 Unauthorized")));
            }

            let mut state = instrument_id.bytes().map(u64::from).sum::<u64>() * 2_654_435_761;
            Ok(DeltaSeries::from_points((0..240).map(|i| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                DeltaPoint {
                    timestamp_ms: window.start_ms + i * 60_000,
                    value: (state % 997) as f64 / 100.0,
                }
            })))
        }
    }

    fn instruments() -> Vec<Instrument> {
        (1..=3)
            .map(|i| Instrument {
                id: format!("ID{i}"),
                display_name: format!("TICK{i}"),
            })
            .collect()
    }

    fn window() -> FetchWindow {
        FetchWindow::trailing(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(), 240, "1m")
    }

    #[test]
    fn trailing_window_spans_lookback() {
        let w = window();
        assert_eq!(w.end_ms - w.start_ms, 240 * 60_000);
        assert_eq!(w.interval, "1m");
    }

    #[tokio::test]
    async fn fetch_all_preserves_input_order() {
        let source = StubSource { failing: vec![] };
        let inputs = fetch_all(&source, &instruments(), &window(), 3).await;
        let names: Vec<_> = inputs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["TICK1", "TICK2", "TICK3"]);
        assert!(inputs.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn data_source_failure_is_isolated_in_batch() {
        let source = StubSource { failing: vec!["ID2"] };
        let inputs = fetch_all(&source, &instruments(), &window(), 2).await;

        let report = BatchEstimator::new(ScaleLadder::linear(8).unwrap()).run_batch(inputs);

        assert_eq!(report.result.ids().collect::<Vec<_>>(), vec!["TICK1", "TICK3"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "TICK2");
        assert_eq!(report.failures[0].kind, FailureKind::DataSource);
    }

    #[tokio::test]
    async fn zero_concurrency_is_treated_as_one() {
        let source = StubSource { failing: vec![] };
        let inputs = fetch_all(&source, &instruments()[..1], &window(), 0).await;
        assert_eq!(inputs.len(), 1);
    }
}
