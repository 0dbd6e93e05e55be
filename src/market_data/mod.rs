pub mod candles;
pub mod source;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use candles::{deltas_from_candles, Candle};
pub use source::{fetch_all, DeltaSource, FetchWindow};
