//! Reporting and export — JSON report plus equity and trade CSVs.
//!
//! The JSON report carries a `schema_version`; newer versions are rejected
//! on import.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use siglab_core::{BacktestResult, PriceSeries, Trade};

use crate::runner::{EvaluationReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `EvaluationReport` to pretty JSON.
pub fn export_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EvaluationReport to JSON")
}

/// Deserialize an `EvaluationReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<EvaluationReport> {
    let report: EvaluationReport =
        serde_json::from_str(json).context("failed to deserialize EvaluationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Equity curve as CSV. Columns: index, ts, equity.
///
/// The curve must come from a backtest over `prices`.
pub fn export_equity_csv(prices: &PriceSeries, result: &BacktestResult) -> Result<String> {
    if prices.len() != result.equity_curve.len() {
        bail!(
            "equity curve has {} points but the price series has {} bars",
            result.equity_curve.len(),
            prices.len()
        );
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "ts", "equity"])?;
    for (i, (bar, equity)) in prices.bars().iter().zip(&result.equity_curve).enumerate() {
        wtr.write_record([
            i.to_string(),
            bar.timestamp.to_string(),
            format!("{equity:.8}"),
        ])?;
    }
    finish(wtr)
}

/// Trade tape as CSV. Columns: ts, side, price, size.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ts", "side", "price", "size"])?;
    for t in trades {
        wtr.write_record([
            t.timestamp.to_string(),
            t.side.as_str().to_string(),
            format!("{:.6}", t.price),
            format!("{}", t.size),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Paths written by [`save_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub report: PathBuf,
    pub equity: PathBuf,
    pub trades: PathBuf,
}

/// Write `report.json`, `equity.csv` and `trades.csv` into `dir`.
pub fn save_artifacts(
    dir: &Path,
    report: &EvaluationReport,
    prices: &PriceSeries,
) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let paths = ArtifactPaths {
        report: dir.join("report.json"),
        equity: dir.join("equity.csv"),
        trades: dir.join("trades.csv"),
    };
    write(&paths.report, &export_json(report)?)?;
    write(&paths.equity, &export_equity_csv(prices, &report.backtest)?)?;
    write(&paths.trades, &export_trades_csv(&report.backtest.trades)?)?;

    info!(dir = %dir.display(), "artifacts saved");
    Ok(paths)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
