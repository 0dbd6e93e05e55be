// =============================================================================
// Fractal Scan — Main Entry Point
// =============================================================================
//
// Fetches candle deltas for the configured instruments and runs one of:
//   scaling      — σ(Δt) over a ladder of scales + log-log fit, results file
//   rolling      — rolling mean / median / std of deltas
//   distribution — histogram of deltas
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod binance;
mod errors;
mod market_data;
mod report;
mod results;
mod runtime_config;
mod scaling;
mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::binance::BinanceClient;
use crate::market_data::{fetch_all, FetchWindow};
use crate::report::{render_all, LogReporter};
use crate::runtime_config::RuntimeConfig;
use crate::scaling::BatchEstimator;
use crate::types::{AnalysisMode, DeltaSeries};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("FRACTAL_CONFIG").unwrap_or_else(|_| "configs/fractal_scan.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = RuntimeConfig::default();
        if !std::path::Path::new(&config_path).exists() {
            if let Err(e) = defaults.save(&config_path) {
                warn!(error = %e, "Failed to write default config");
            }
        }
        defaults
    });

    if let Ok(list) = std::env::var("FRACTAL_INSTRUMENTS") {
        config.override_instruments(&list);
    }
    if let Ok(mode) = std::env::var("FRACTAL_MODE") {
        config.mode = mode
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid FRACTAL_MODE")?;
    }
    config.source.api_key = std::env::var("BINANCE_API_KEY").ok();
    config
        .validate_instruments()
        .context("invalid instrument list")?;

    let ladder = config.scale_ladder().context("invalid scale ladder in config")?;

    info!(
        mode = %config.mode,
        instruments = config.instruments.len(),
        ladder = %config.ladder,
        widths = ?ladder.widths(),
        interval = %config.candle_interval,
        lookback_minutes = config.lookback_minutes,
        "Fractal scan starting"
    );

    // ── 2. Fetch deltas ──────────────────────────────────────────────────
    let client = BinanceClient::new(&config.source)?;
    let window = FetchWindow::trailing(Utc::now(), config.lookback_minutes, &config.candle_interval);
    let inputs = fetch_all(&client, &config.instruments, &window, config.fetch_concurrency).await;

    // ── 3. Analyse ───────────────────────────────────────────────────────
    match config.mode {
        AnalysisMode::Scaling => {
            let estimator = BatchEstimator::new(ladder);
            let report = tokio::task::block_in_place(|| estimator.run_batch(inputs));

            render_all(&report, estimator.ladder(), &mut LogReporter);

            for failure in &report.failures {
                warn!(instrument = %failure.id, kind = %failure.kind, "{}", failure.message);
            }

            let path = results::write_results(&config.results_dir, &report.result, Utc::now())?;
            info!(
                path = %path.display(),
                succeeded = report.result.len(),
                failed = report.failures.len(),
                "Scaling exponents saved"
            );
        }
        AnalysisMode::Rolling => {
            for (name, fetched) in &inputs {
                match fetched {
                    Ok(series) => {
                        analysis::log_rolling_summary(name, series, config.rolling_window);
                    }
                    Err(e) => warn!(instrument = %name, error = %e, "Error fetching"),
                }
            }
        }
        AnalysisMode::Distribution => {
            let fetched: Vec<(&str, &DeltaSeries)> = inputs
                .iter()
                .filter_map(|(name, fetched)| match fetched {
                    Ok(series) => Some((name.as_str(), series)),
                    Err(e) => {
                        warn!(instrument = %name, error = %e, "Error fetching");
                        None
                    }
                })
                .collect();
            if analysis::log_distributions(fetched, config.histogram_bins).is_empty() {
                warn!("No data collected.");
            }
        }
    }

    info!("Fractal scan complete.");
    Ok(())
}
