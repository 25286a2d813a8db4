//! Result sinks keyed by composite series/parameter keys.
//!
//! Upserts are idempotent and last-write-wins: recomputing a result for the
//! same key replaces the stored value. A key always maps to the same record
//! id (BLAKE3 of the key's canonical form), so repeated upserts return the
//! same id.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use siglab_core::{AccuracyResult, BacktestResult};

/// Stable identifier of a stored record.
pub type RecordId = String;

/// Errors from a result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

// ─── Keys ────────────────────────────────────────────────────────────

/// Identifies one price/signal series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub tenant: String,
    pub market: String,
    pub symbol: String,
    pub timeframe: String,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.tenant, self.market, self.symbol, self.timeframe
        )
    }
}

/// Accuracy results are keyed by series and horizon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccuracyKey {
    pub series: SeriesKey,
    pub horizon_bars: usize,
}

/// Backtest results are keyed by series and cost parameters.
///
/// Costs compare by bit pattern so the key can be hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestKey {
    pub series: SeriesKey,
    pub fee_bps: f64,
    pub slippage_bps: f64,
}

impl PartialEq for BacktestKey {
    fn eq(&self, other: &Self) -> bool {
        self.series == other.series
            && self.fee_bps.to_bits() == other.fee_bps.to_bits()
            && self.slippage_bps.to_bits() == other.slippage_bps.to_bits()
    }
}

impl Eq for BacktestKey {}

impl Hash for BacktestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.series.hash(state);
        self.fee_bps.to_bits().hash(state);
        self.slippage_bps.to_bits().hash(state);
    }
}

/// A key with a canonical, collision-resistant record id.
pub trait CompositeKey {
    fn canonical(&self) -> String;

    fn record_id(&self) -> RecordId {
        blake3::hash(self.canonical().as_bytes()).to_hex()[..32].to_string()
    }
}

impl CompositeKey for AccuracyKey {
    fn canonical(&self) -> String {
        format!("accuracy|{}|h={}", self.series, self.horizon_bars)
    }
}

impl CompositeKey for BacktestKey {
    fn canonical(&self) -> String {
        format!(
            "backtest|{}|fee={}|slip={}",
            self.series, self.fee_bps, self.slippage_bps
        )
    }
}

// ─── Store trait ─────────────────────────────────────────────────────

/// Persistence sink for computed results.
pub trait ResultStore: Send + Sync {
    fn upsert_accuracy(
        &self,
        key: &AccuracyKey,
        result: &AccuracyResult,
    ) -> Result<RecordId, StoreError>;

    fn upsert_backtest(
        &self,
        key: &BacktestKey,
        result: &BacktestResult,
    ) -> Result<RecordId, StoreError>;

    fn get_accuracy(&self, key: &AccuracyKey) -> Result<Option<AccuracyResult>, StoreError>;

    fn get_backtest(&self, key: &BacktestKey) -> Result<Option<BacktestResult>, StoreError>;
}

// ─── In-memory ───────────────────────────────────────────────────────

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accuracy: RwLock<HashMap<AccuracyKey, AccuracyResult>>,
    backtest: RwLock<HashMap<BacktestKey, BacktestResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accuracy_count(&self) -> Result<usize, StoreError> {
        let map = self.accuracy.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.len())
    }

    pub fn backtest_count(&self) -> Result<usize, StoreError> {
        let map = self.backtest.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.len())
    }
}

impl ResultStore for MemoryStore {
    fn upsert_accuracy(
        &self,
        key: &AccuracyKey,
        result: &AccuracyResult,
    ) -> Result<RecordId, StoreError> {
        let mut map = self.accuracy.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.clone(), result.clone());
        Ok(key.record_id())
    }

    fn upsert_backtest(
        &self,
        key: &BacktestKey,
        result: &BacktestResult,
    ) -> Result<RecordId, StoreError> {
        let mut map = self.backtest.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.clone(), result.clone());
        Ok(key.record_id())
    }

    fn get_accuracy(&self, key: &AccuracyKey) -> Result<Option<AccuracyResult>, StoreError> {
        let map = self.accuracy.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn get_backtest(&self, key: &BacktestKey) -> Result<Option<BacktestResult>, StoreError> {
        let map = self.backtest.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }
}

// ─── JSON directory ──────────────────────────────────────────────────

/// One pretty-JSON file per key under `root/{accuracy,backtest}/<id>.json`.
///
/// Writes go to a temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct StoredRecord<K, R> {
    id: RecordId,
    key: K,
    result: R,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{id}.json"))
    }

    fn write<K: Serialize + CompositeKey, R: Serialize>(
        &self,
        kind: &str,
        key: &K,
        result: &R,
    ) -> Result<RecordId, StoreError> {
        let id = key.record_id();
        let path = self.path_for(kind, &id);
        let dir = self.root.join(kind);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let record = StoredRecord {
            id: id.clone(),
            key,
            result,
        };
        let json = serde_json::to_string_pretty(&record)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(kind, id = %id, path = %path.display(), "record upserted");
        Ok(id)
    }

    fn read<K: DeserializeOwned, R: DeserializeOwned>(
        &self,
        kind: &str,
        id: &str,
    ) -> Result<Option<R>, StoreError> {
        let path = self.path_for(kind, id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let record: StoredRecord<K, R> = serde_json::from_str(&text)?;
        Ok(Some(record.result))
    }
}

impl ResultStore for JsonDirStore {
    fn upsert_accuracy(
        &self,
        key: &AccuracyKey,
        result: &AccuracyResult,
    ) -> Result<RecordId, StoreError> {
        self.write("accuracy", key, result)
    }

    fn upsert_backtest(
        &self,
        key: &BacktestKey,
        result: &BacktestResult,
    ) -> Result<RecordId, StoreError> {
        self.write("backtest", key, result)
    }

    fn get_accuracy(&self, key: &AccuracyKey) -> Result<Option<AccuracyResult>, StoreError> {
        self.read::<AccuracyKey, _>("accuracy", &key.record_id())
    }

    fn get_backtest(&self, key: &BacktestKey) -> Result<Option<BacktestResult>, StoreError> {
        self.read::<BacktestKey, _>("backtest", &key.record_id())
    }
}
