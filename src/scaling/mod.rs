// =============================================================================
// Scaling Module — aggregated-dispersion estimate of the Hurst exponent
// =============================================================================
//
// For a delta series and a ladder of bucket widths Δt:
//
//   1. aggregate  — sum deltas per calendar-aligned bucket of width Δt
//   2. dispersion — sample standard deviation σ(Δt) of the bucket sums
//   3. fit        — OLS of ln σ(Δt) on ln Δt; the slope is the exponent
//
//   slope ≈ 0.5  =>  random walk
//   slope > 0.5  =>  persistent
//   slope < 0.5  =>  anti-persistent

pub mod aggregate;
pub mod batch;
pub mod dispersion;
pub mod fit;
pub mod ladder;
pub mod runner;

pub use batch::{BatchEstimator, BatchInput, BatchReport, BatchResult, InstrumentFailure};
pub use dispersion::DispersionProfile;
pub use fit::FitResult;
pub use ladder::ScaleLadder;
pub use runner::{Estimate, InstrumentRunner};
