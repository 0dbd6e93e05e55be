// =============================================================================
// Scale Ladder — ordered aggregation widths (minutes)
// =============================================================================

use serde::Serialize;

use crate::errors::LadderError;
use crate::types::LadderKind;

/// Milliseconds per minute.
pub const MINUTE_MS: i64 = 60_000;

/// Strictly increasing, non-empty list of positive bucket widths in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleLadder {
    widths: Vec<u32>,
}

impl ScaleLadder {
    /// Validate and wrap an explicit list of widths.
    pub fn new(widths: Vec<u32>) -> Result<Self, LadderError> {
        if widths.is_empty() {
            return Err(LadderError::Empty);
        }
        if let Some(&w) = widths.iter().find(|&&w| w == 0) {
            return Err(LadderError::NonPositive(w));
        }
        if let Some(pair) = widths.windows(2).find(|p| p[0] >= p[1]) {
            return Err(LadderError::NotIncreasing {
                prev: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { widths })
    }

    /// `1, 2, ..., k` minutes.
    pub fn linear(k: u32) -> Result<Self, LadderError> {
        Self::new((1..=k).collect())
    }

    /// `2^1, 2^2, ..., 2^k` minutes.
    pub fn dyadic(k: u32) -> Result<Self, LadderError> {
        let widths = (1..=k)
            .map(|i| 2u32.checked_pow(i).ok_or(LadderError::Overflow(k)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(widths)
    }

    pub fn build(kind: LadderKind, depth: u32) -> Result<Self, LadderError> {
        match kind {
            LadderKind::Linear => Self::linear(depth),
            LadderKind::Dyadic => Self::dyadic(depth),
        }
    }

    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }
}

/// Width in milliseconds for a width in minutes.
pub fn width_ms(minutes: u32) -> i64 {
    i64::from(minutes) * MINUTE_MS
}
