// =============================================================================
// Binance REST Client — public klines as a delta source
// =============================================================================
//
// Only the public market-data endpoint is used, so requests are unsigned. An
// API key, when configured, is still sent as `X-MBX-APIKEY` to get a per-key
// rate-limit bucket. The key is never logged.
//
// Klines are capped at 1000 per request; a window longer than that is walked
// page by page, moving `startTime` past the last candle received.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::binance::rate_limit::RateLimitTracker;
use crate::errors::EstimateError;
use crate::market_data::{deltas_from_candles, Candle, DeltaSource, FetchWindow};
use crate::runtime_config::SourceConfig;
use crate::types::DeltaSeries;

/// Maximum klines returned by one request.
const KLINES_PAGE_LIMIT: u32 = 1000;

/// Request weight charged for one klines call.
const KLINES_WEIGHT: u32 = 2;

/// Binance REST client limited to public market data.
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    weights: RateLimitTracker,
}

impl BinanceClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Build a client from explicit source settings.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let val = HeaderValue::from_str(key).context("API key is not a valid header value")?;
            default_headers.insert("X-MBX-APIKEY", val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "BinanceClient initialised");

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            weights: RateLimitTracker::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// GET /api/v3/klines for a single page.
    #[instrument(skip(self), name = "binance::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        self.wait_for_weight().await;

        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url, symbol, interval, start_ms, end_ms, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/klines request failed")?;

        self.weights.update_from_headers(resp.headers());

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("Binance GET /api/v3/klines returned {}: {}", status, body);
        }

        let candles = parse_klines(&body)?;
        debug!(symbol, interval, count = candles.len(), "klines page fetched");
        Ok(candles)
    }

    /// Every kline of `symbol` whose open time lies inside `window`.
    pub async fn get_klines_range(&self, symbol: &str, window: &FetchWindow) -> Result<Vec<Candle>> {
        let mut candles: Vec<Candle> = Vec::new();
        let mut cursor = window.start_ms;

        while cursor <= window.end_ms {
            let page = self
                .get_klines(symbol, &window.interval, cursor, window.end_ms, KLINES_PAGE_LIMIT)
                .await
                .with_context(|| format!("klines page starting at {cursor} for {symbol}"))?;

            let step = next_cursor(page.len(), page.last().map(|c| c.open_time), cursor);
            candles.extend(page);

            match step {
                Some(next) => cursor = next,
                None => break,
            }
        }

        debug!(symbol, count = candles.len(), "klines range fetched");
        Ok(candles)
    }

    /// Hold back until the shared weight budget can absorb one more klines
    /// call. The exchange window is one minute, so waiting for the next
    /// minute boundary always frees it.
    async fn wait_for_weight(&self) {
        if self.weights.can_send_request(KLINES_WEIGHT) {
            return;
        }
        let now_ms = chrono::Utc::now().timestamp_millis();
        let wait_ms = 60_000 - now_ms.rem_euclid(60_000) + 250;
        warn!(wait_ms, "request weight exhausted — pausing until next minute");
        tokio::time::sleep(Duration::from_millis(wait_ms as u64)).await;
        self.weights.reset_1m_weight();
    }
}

impl DeltaSource for BinanceClient {
    async fn fetch(&self, instrument_id: &str, window: &FetchWindow) -> Result<DeltaSeries, EstimateError> {
        self.get_klines_range(instrument_id, window)
            .await
            .map(|candles| deltas_from_candles(&candles))
            .map_err(|e| EstimateError::DataSource(format!("{e:#}")))
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("weights", &self.weights)
            .finish()
    }
}

/// Start of the next klines page, or `None` when the range is exhausted.
///
/// A page shorter than the limit is the last one. A full page continues one
/// millisecond past its last open time, unless that would not move the cursor
/// forward.
fn next_cursor(page_len: usize, last_open: Option<i64>, cursor: i64) -> Option<i64> {
    let last_open = last_open?;
    if page_len < KLINES_PAGE_LIMIT as usize || last_open < cursor {
        return None;
    }
    Some(last_open + 1)
}

// -----------------------------------------------------------------------------
// Payload parsing
// -----------------------------------------------------------------------------

/// Parse Binance's array-of-arrays klines payload.
///
/// Array indices:
///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades,
///   [9] takerBuyBaseVolume, [10] takerBuyQuoteVolume
fn parse_klines(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let raw = body.as_array().context("klines response is not an array")?;

    let mut candles = Vec::with_capacity(raw.len());
    for entry in raw {
        let arr = entry.as_array().context("kline entry is not an array")?;

        if arr.len() < 7 {
            warn!("skipping malformed kline entry with {} elements", arr.len());
            continue;
        }

        let open_time = arr[0].as_i64().context("kline openTime is not an integer")?;
        let open = parse_str_f64(&arr[1])?;
        let high = parse_str_f64(&arr[2])?;
        let low = parse_str_f64(&arr[3])?;
        let close = parse_str_f64(&arr[4])?;
        let volume = parse_str_f64(&arr[5])?;
        let close_time = arr[6].as_i64().context("kline closeTime is not an integer")?;

        candles.push(Candle::new(open_time, open, high, low, close, volume, close_time));
    }
    Ok(candles)
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}
