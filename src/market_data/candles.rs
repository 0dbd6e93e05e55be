use serde::{Deserialize, Serialize};

use crate::types::{DeltaPoint, DeltaSeries};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single closed OHLCV candle from the REST klines endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        close_time: i64,
    ) -> Self {
        Self {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Absolute candle body, |close - open|.
    pub fn delta(&self) -> f64 {
        (self.close - self.open).abs()
    }
}

/// Reduce candles to a delta series keyed by open time. Candles with a
/// non-finite body are skipped.
pub fn deltas_from_candles(candles: &[Candle]) -> DeltaSeries {
    DeltaSeries::from_points(
        candles
            .iter()
            .filter(|c| c.delta().is_finite())
            .map(|c| DeltaPoint {
                timestamp_ms: c.open_time,
                value: c.delta(),
            }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
