// =============================================================================
// Result Writer — one timestamped JSON file per batch run
// =============================================================================
//
// The file is opened with create-new semantics: if a file with the same stamp
// already exists the write fails instead of replacing it.
// =============================================================================

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::scaling::BatchResult;

/// `data_YYYYMMDD_HHMMSS.json` for the given instant.
pub fn result_file_name(at: DateTime<Utc>) -> String {
    format!("data_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Serialize `result` as a flat `{name: slope}` object into `dir`.
pub fn write_results(dir: impl AsRef<Path>, result: &BatchResult, at: DateTime<Utc>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create results directory {}", dir.display()))?;

    let path = dir.join(result_file_name(at));

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("refusing to write results to {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, result).context("failed to serialise batch result")?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    info!(path = %path.display(), instruments = result.len(), "results written");
    Ok(path)
}
