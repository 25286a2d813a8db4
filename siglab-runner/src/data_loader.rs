//! CSV loading for price and signal series, plus synthetic prices.
//!
//! Price files carry `ts,open,high,low,close,volume` and any number of extra
//! numeric columns, which become feature columns (e.g. a precomputed `rsi`).
//! Signal files carry `ts,signal` and optional numeric metadata columns.
//!
//! Timestamps are either integer epoch milliseconds or RFC 3339 strings
//! (converted to epoch milliseconds). The timestamp column may be named `ts`
//! or `timestamp`. Rows may appear in any order; they are sorted on load.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use thiserror::Error;
use tracing::{debug, warn};

use siglab_core::{Bar, DataError, PriceSeries, SignalMetadata, SignalPoint, SignalSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse column '{column}' value '{value}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

const TS_COLUMNS: [&str; 2] = ["ts", "timestamp"];
const OHLCV: [&str; 5] = ["open", "high", "low", "close", "volume"];

// ─── Column helpers ──────────────────────────────────────────────────

fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn find_ts_column(headers: &csv::StringRecord) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| TS_COLUMNS.contains(&h))
        .ok_or(LoadError::MissingColumn("ts"))
}

fn find_column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(LoadError::MissingColumn(name))
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

fn parse_error(row: usize, column: &str, value: &str) -> LoadError {
    LoadError::Parse {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Integer epoch milliseconds, or RFC 3339 converted to epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(ts) = raw.parse::<i64>() {
        return Some(ts);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn parse_f64(row: usize, column: &str, raw: &str) -> Result<f64, LoadError> {
    raw.parse::<f64>()
        .map_err(|_| parse_error(row, column, raw))
}

/// Feature cells may be blank (indicator warm-up); blanks read as NaN.
fn parse_optional_f64(row: usize, column: &str, raw: &str) -> Result<f64, LoadError> {
    if raw.is_empty() {
        Ok(f64::NAN)
    } else {
        parse_f64(row, column, raw)
    }
}

fn open_file(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Prices ──────────────────────────────────────────────────────────

/// Read a price CSV from any reader.
pub fn read_prices<R: Read>(rdr: R) -> Result<PriceSeries, LoadError> {
    let mut rdr = reader(rdr);
    let headers = rdr.headers()?.clone();

    let ts_idx = find_ts_column(&headers)?;
    let mut ohlcv_idx = [0usize; 5];
    for (slot, name) in ohlcv_idx.iter_mut().zip(OHLCV) {
        *slot = find_column(&headers, name)?;
    }
    let feature_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx && !ohlcv_idx.contains(i))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows: Vec<(Bar, Vec<f64>)> = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_ts = field(&record, ts_idx);
        let timestamp =
            parse_timestamp(raw_ts).ok_or_else(|| parse_error(row, "ts", raw_ts))?;
        let mut values = [0.0f64; 5];
        for ((value, idx), name) in values.iter_mut().zip(ohlcv_idx).zip(OHLCV) {
            *value = parse_f64(row, name, field(&record, idx))?;
        }
        let [open, high, low, close, volume] = values;
        let features = feature_cols
            .iter()
            .map(|(idx, name)| parse_optional_f64(row, name, field(&record, *idx)))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((
            Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            },
            features,
        ));
    }

    // sort rows together so feature cells stay attached to their bar
    rows.sort_by_key(|(bar, _)| bar.timestamp);

    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); feature_cols.len()];
    let mut bars = Vec::with_capacity(rows.len());
    for (bar, features) in rows {
        for (column, value) in columns.iter_mut().zip(features) {
            column.push(value);
        }
        bars.push(bar);
    }

    let mut series = PriceSeries::new(bars)?;
    for ((_, name), values) in feature_cols.into_iter().zip(columns) {
        series = series.with_feature(name, values)?;
    }
    debug!(
        bars = series.len(),
        features = series.feature_names().count(),
        "prices loaded"
    );
    Ok(series)
}

/// Load a price CSV from disk.
pub fn load_prices(path: &Path) -> Result<PriceSeries, LoadError> {
    read_prices(open_file(path)?)
}

// ─── Signals ─────────────────────────────────────────────────────────

/// Read a signal CSV from any reader.
pub fn read_signals<R: Read>(rdr: R) -> Result<SignalSeries, LoadError> {
    let mut rdr = reader(rdr);
    let headers = rdr.headers()?.clone();

    let ts_idx = find_ts_column(&headers)?;
    let signal_idx = find_column(&headers, "signal")?;
    let meta_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx && *i != signal_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut points = Vec::new();
    let mut metadata = SignalMetadata::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_ts = field(&record, ts_idx);
        let timestamp =
            parse_timestamp(raw_ts).ok_or_else(|| parse_error(row, "ts", raw_ts))?;
        let raw_signal = field(&record, signal_idx);
        let value = raw_signal
            .parse::<i64>()
            .map_err(|_| parse_error(row, "signal", raw_signal))?;
        points.push(SignalPoint::from_raw(timestamp, value)?);

        let mut meta = BTreeMap::new();
        for (idx, name) in &meta_cols {
            let raw = field(&record, *idx);
            if !raw.is_empty() {
                meta.insert(name.clone(), parse_f64(row, name, raw)?);
            }
        }
        if !meta.is_empty() {
            metadata.insert(timestamp, meta);
        }
    }

    let series = SignalSeries::new(points)?.with_metadata(metadata);
    debug!(points = series.len(), "signals loaded");
    Ok(series)
}

/// Load a signal CSV from disk.
pub fn load_signals(path: &Path) -> Result<SignalSeries, LoadError> {
    read_signals(open_file(path)?)
}

// ─── Hashing & synthetic data ────────────────────────────────────────

/// Deterministic BLAKE3 hash over timestamps, OHLCV values and feature columns.
pub fn dataset_hash(prices: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in prices.bars() {
        hasher.update(&bar.timestamp.to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    for name in prices.feature_names() {
        hasher.update(name.as_bytes());
        for value in prices.feature(name).unwrap_or_default() {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Seeded random-walk prices starting at 100.0, for demos and smoke tests.
///
/// Results computed on these bars should be tagged as synthetic. `step_ms`
/// must be positive, otherwise timestamps collide and the series is rejected.
pub fn synthetic_prices(
    n: usize,
    seed: u64,
    start_ts: i64,
    step_ms: i64,
) -> Result<PriceSeries, DataError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    warn!(bars = n, seed, "generating synthetic prices");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let ret: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + ret);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume = rng.gen_range(1_000.0..50_000.0);
        bars.push(Bar {
            timestamp: start_ts.saturating_add(step_ms.saturating_mul(i as i64)),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }
    PriceSeries::new(bars)
}
