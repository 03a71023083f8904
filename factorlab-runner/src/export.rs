//! Artifact export: CSV ledgers, Parquet account ledger, JSON manifest.
//!
//! A run directory holds:
//! - `manifest.json`: provenance, config, metrics, diagnostics
//! - `positions.csv`: units per symbol per date
//! - `holdings.csv`: dollar value per symbol per date, plus `cash`
//! - `account.csv` / `account.parquet`: equities and cash per date
//!
//! The manifest carries a `schema_version`. Unknown versions are rejected on
//! load.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use factorlab_core::engine::{AccountLedger, RunDiagnostics};
use factorlab_core::Frame;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{BacktestConfig, RunId};
use crate::data_loader::write_wide_csv;
use crate::metrics::PerformanceMetrics;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Everything about a run except the ledgers themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub symbols: Vec<String>,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub diagnostics: RunDiagnostics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunManifest {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            dataset_hash: result.dataset_hash.clone(),
            synthetic: result.synthetic,
            start_date: result.start_date(),
            end_date: result.end_date(),
            symbols: result.simulation.positions.columns().to_vec(),
            config: result.config.clone(),
            metrics: result.metrics.clone(),
            diagnostics: result.simulation.diagnostics.clone(),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_manifest_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize run manifest")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize run manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Wide CSV of a date × column table.
pub fn export_frame_csv(frame: &Frame) -> Result<String> {
    let mut buf = Vec::new();
    write_wide_csv(&mut buf, frame).context("failed to write CSV")?;
    String::from_utf8(buf).context("CSV output is not valid UTF-8")
}

/// Account ledger as CSV: date, equities, cash, total_value.
pub fn export_account_csv(account: &AccountLedger) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equities", "cash", "total_value"])?;
    for row in account.rows() {
        wtr.write_record([
            row.date.to_string(),
            row.equities.to_string(),
            row.cash.to_string(),
            row.total_value().to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Parquet ────────────────────────────────────────────────────────

fn account_to_dataframe(account: &AccountLedger) -> Result<DataFrame> {
    // days since 1970-01-01
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = account
        .rows()
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .context("date cast")?,
        Column::new("equities".into(), account.equities()),
        Column::new("cash".into(), account.cash()),
        Column::new("total_value".into(), account.total_value()),
    ])
    .context("dataframe creation")
}

pub fn write_account_parquet(account: &AccountLedger, path: &Path) -> Result<()> {
    let mut df = account_to_dataframe(account)?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run under `output_dir/<run_id>/`.
///
/// Re-running an identical config over identical data overwrites the same
/// directory. Returns the path to the run directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let manifest = RunManifest::from_result(result);
    std::fs::write(run_dir.join("manifest.json"), export_manifest_json(&manifest)?)?;

    let sim = &result.simulation;
    std::fs::write(run_dir.join("positions.csv"), export_frame_csv(&sim.positions)?)?;
    let holdings = sim
        .holdings
        .to_frame()
        .context("failed to assemble holdings table")?;
    std::fs::write(run_dir.join("holdings.csv"), export_frame_csv(&holdings)?)?;
    std::fs::write(run_dir.join("account.csv"), export_account_csv(&sim.account)?)?;
    write_account_parquet(&sim.account, &run_dir.join("account.parquet"))?;

    Ok(run_dir)
}

/// Load the manifest from a run directory.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest_json(&json)
}
