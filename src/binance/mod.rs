// =============================================================================
// Binance adapter — REST klines client and request-weight tracking
// =============================================================================

pub mod client;
pub mod rate_limit;

pub use client::BinanceClient;
