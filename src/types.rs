// =============================================================================
// Shared types used across the fractal scanner
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One sampled candle reduced to its absolute body size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaPoint {
    /// Candle open time, UTC epoch milliseconds.
    pub timestamp_ms: i64,
    /// |close - open|, never negative.
    pub value: f64,
}

/// Ordered sequence of finite, non-negative delta observations with strictly
/// increasing timestamps. Only [`DeltaSeries::from_points`] builds one, and it
/// is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeltaSeries {
    points: Vec<DeltaPoint>,
}

impl DeltaSeries {
    /// Build a series from raw points. A point is kept only when its value is
    /// finite and non-negative and its timestamp is strictly greater than the
    /// previous kept one.
    pub fn from_points(points: impl IntoIterator<Item = DeltaPoint>) -> Self {
        let mut kept: Vec<DeltaPoint> = Vec::new();
        let mut out_of_order = 0usize;
        let mut invalid = 0usize;

        for p in points {
            if !p.value.is_finite() || p.value < 0.0 {
                invalid += 1;
                continue;
            }
            match kept.last() {
                Some(last) if p.timestamp_ms <= last.timestamp_ms => out_of_order += 1,
                _ => kept.push(p),
            }
        }

        if out_of_order > 0 {
            warn!(dropped = out_of_order, kept = kept.len(), "dropped non-increasing delta timestamps");
        }
        if invalid > 0 {
            warn!(dropped = invalid, kept = kept.len(), "dropped negative or non-finite delta values");
        }

        Self { points: kept }
    }

    pub fn points(&self) -> &[DeltaPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of every observation's value.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// An instrument as listed in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Identifier understood by the market-data source (e.g. "BTCUSDT").
    pub id: String,
    /// Human-readable label used as the key of the result file.
    #[serde(alias = "ticker")]
    pub display_name: String,
}

/// Which analysis the binary runs over the configured instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Multi-scale dispersion + power-law fit, written to a result file.
    Scaling,
    /// Rolling mean / median / std of raw deltas.
    Rolling,
    /// Histogram of raw deltas.
    Distribution,
}

impl Default for AnalysisMode {
    fn default() -> Self {
        Self::Scaling
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scaling => write!(f, "scaling"),
            Self::Rolling => write!(f, "rolling"),
            Self::Distribution => write!(f, "distribution"),
        }
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scaling" => Ok(Self::Scaling),
            "rolling" => Ok(Self::Rolling),
            "distribution" => Ok(Self::Distribution),
            other => Err(format!("unknown analysis mode '{other}'")),
        }
    }
}

/// Shape of the scale ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LadderKind {
    /// 1, 2, 3, ..., K minutes.
    Linear,
    /// 2, 4, 8, ..., 2^K minutes.
    Dyadic,
}

impl Default for LadderKind {
    fn default() -> Self {
        Self::Linear
    }
}

impl std::fmt::Display for LadderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Dyadic => write!(f, "dyadic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(ts: i64, v: f64) -> DeltaPoint {
        DeltaPoint { timestamp_ms: ts, value: v }
    }

    #[test]
    fn from_points_drops_non_increasing_timestamps() {
        let series = DeltaSeries::from_points(vec![
            pt(0, 1.0),
            pt(60_000, 2.0),
            pt(60_000, 9.0),
            pt(30_000, 9.0),
            pt(120_000, 3.0),
        ]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
        assert!((series.total() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_points_drops_negative_and_non_finite_values() {
        let series = DeltaSeries::from_points(vec![
            pt(0, 1.0),
            pt(60_000, -0.5),
            pt(120_000, f64::NAN),
            pt(180_000, f64::INFINITY),
            pt(240_000, 0.0),
            pt(300_000, 2.5),
        ]);
        assert_eq!(series.values(), vec![1.0, 0.0, 2.5]);
        assert_eq!(series.points()[1].timestamp_ms, 240_000);
    }

    #[test]
    fn empty_series_is_valid() {
        let series = DeltaSeries::from_points(Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.total(), 0.0);
    }

    #[test]
    fn instrument_accepts_ticker_alias() {
        let json = r#"{ "id": "BBG004730N88", "ticker": "SBER" }"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.display_name, "SBER");
    }

    #[test]
    fn analysis_mode_parses_case_insensitively() {
        assert_eq!("Rolling".parse::<AnalysisMode>(), Ok(AnalysisMode::Rolling));
        assert!("bogus".parse::<AnalysisMode>().is_err());
    }
}
