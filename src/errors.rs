// =============================================================================
// Error taxonomy for the scaling pipeline
// =============================================================================
//
// Every per-instrument failure is one of three kinds. The batch layer records
// the kind next to the instrument id so reports stay structured instead of
// carrying free-text exception messages.
//
// Aggregation and dispersion never fail; they degrade to empty / undefined
// outputs. Failures originate in the fitter, the runner, or the data source.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-instrument failure raised by the estimation pipeline or its data source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// The delta series carried no observations at all.
    #[error("delta series is empty")]
    EmptySeries,

    /// Fewer than two usable (scale, dispersion) pairs, or fewer than two
    /// distinct scale values among them.
    #[error("insufficient data for regression: {usable} usable pairs, {distinct} distinct scales")]
    InsufficientData { usable: usize, distinct: usize },

    /// Opaque failure from the market-data collaborator (network, auth, parse).
    #[error("data source error: {0}")]
    DataSource(String),
}

impl EstimateError {
    /// Serializable discriminant of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptySeries => FailureKind::EmptySeries,
            Self::InsufficientData { .. } => FailureKind::InsufficientData,
            Self::DataSource(_) => FailureKind::DataSource,
        }
    }
}

/// Closed set of failure kinds reported by the batch estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    EmptySeries,
    InsufficientData,
    DataSource,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySeries => write!(f, "EMPTY_SERIES"),
            Self::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
            Self::DataSource => write!(f, "DATA_SOURCE"),
        }
    }
}

/// Invalid scale ladder. Raised while building configuration, never per
/// instrument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LadderError {
    #[error("scale ladder must contain at least one width")]
    Empty,

    #[error("scale width must be positive (got {0})")]
    NonPositive(u32),

    #[error("scale ladder must be strictly increasing ({prev} followed by {next})")]
    NotIncreasing { prev: u32, next: u32 },

    #[error("dyadic ladder depth {0} overflows the width type")]
    Overflow(u32),
}
