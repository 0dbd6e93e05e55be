// =============================================================================
// Runtime Configuration — scanner settings loaded from JSON
// =============================================================================
//
// Every tunable parameter of a run lives here: which instruments to scan, the
// window and candle interval to fetch, the scale ladder, and where results go.
//
// All fields carry `#[serde(default)]` so that a partial file (or `{}`) loads.
// Credentials are never read from the file; `main` fills `source.api_key` from
// the environment and hands the whole `SourceConfig` to the client.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::LadderError;
use crate::scaling::ScaleLadder;
use crate::types::{AnalysisMode, Instrument, LadderKind};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_instruments() -> Vec<Instrument> {
    [
        ("BTCUSDT", "BTC"),
        ("ETHUSDT", "ETH"),
        ("BNBUSDT", "BNB"),
        ("XRPUSDT", "XRP"),
        ("SOLUSDT", "SOL"),
    ]
    .into_iter()
    .map(|(id, name)| Instrument {
        id: id.to_string(),
        display_name: name.to_string(),
    })
    .collect()
}

fn default_power_ceiling() -> u32 {
    10
}

fn default_candle_interval() -> String {
    "1m".to_string()
}

fn default_lookback_minutes() -> i64 {
    24 * 60
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_rolling_window() -> usize {
    30
}

fn default_histogram_bins() -> usize {
    50
}

fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// =============================================================================
// SourceConfig
// =============================================================================

/// Settings handed to the market-data client at construction.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional API key; supplied from the environment, never persisted.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration of a scanner run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Which analysis to run.
    #[serde(default)]
    pub mode: AnalysisMode,

    /// Instruments to analyse, in reporting order.
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,

    // --- Scale ladder --------------------------------------------------------

    /// Linear (1..K) or dyadic (2..2^K) minute widths.
    #[serde(default)]
    pub ladder: LadderKind,

    /// Number of rungs on the ladder.
    #[serde(default = "default_power_ceiling")]
    pub power_ceiling: u32,

    // --- Data window ---------------------------------------------------------

    /// Native candle interval requested from the source.
    #[serde(default = "default_candle_interval")]
    pub candle_interval: String,

    /// How far back from now the window reaches.
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,

    /// Maximum concurrent fetches.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    // --- Output & auxiliary analyses ----------------------------------------

    /// Directory receiving `data_YYYYMMDD_HHMMSS.json` result files.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Observations per rolling window (rolling mode).
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    /// Histogram bin count (distribution mode).
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Market-data client settings.
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            instruments: default_instruments(),
            ladder: LadderKind::default(),
            power_ceiling: default_power_ceiling(),
            candle_interval: default_candle_interval(),
            lookback_minutes: default_lookback_minutes(),
            fetch_concurrency: default_fetch_concurrency(),
            results_dir: default_results_dir(),
            rolling_window: default_rolling_window(),
            histogram_bins: default_histogram_bins(),
            source: SourceConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            instruments = config.instruments.len(),
            mode = %config.mode,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// The scale ladder described by `ladder` and `power_ceiling`.
    pub fn scale_ladder(&self) -> Result<ScaleLadder, LadderError> {
        ScaleLadder::build(self.ladder, self.power_ceiling)
    }

    /// Reject instrument lists that repeat an id or a display name. Display
    /// names key the result file, so each must be unique.
    pub fn validate_instruments(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for inst in &self.instruments {
            if !ids.insert(inst.id.as_str()) {
                anyhow::bail!("instrument id '{}' is listed more than once", inst.id);
            }
            if !names.insert(inst.display_name.as_str()) {
                anyhow::bail!(
                    "display name '{}' is used by more than one instrument",
                    inst.display_name
                );
            }
        }
        Ok(())
    }

    /// Replace the instrument list from a comma-separated `ID[:NAME]` list.
    /// Entries without a name use the id as display name.
    pub fn override_instruments(&mut self, list: &str) {
        let parsed: Vec<Instrument> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((id, name)) => Instrument {
                    id: id.trim().to_uppercase(),
                    display_name: name.trim().to_string(),
                },
                None => Instrument {
                    id: entry.to_uppercase(),
                    display_name: entry.to_uppercase(),
                },
            })
            .collect();

        if !parsed.is_empty() {
            self.instruments = parsed;
        }
    }
}
