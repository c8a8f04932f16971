use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::types::MarketId;

pub const VOLUME_FILE: &str = "volume.json";
pub const TRACKING_FILE: &str = "tracking.json";
pub const TRENDS_FILE: &str = "trends.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON document, writing `default` to `path` first if it is absent.
pub fn load_or_create<T>(path: &Path, default: T) -> Result<T, StoreError>
where
    T: Serialize + DeserializeOwned,
{
    if path.exists() {
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        });
    }

    info!("Creating {}", path.display());
    save(path, &default)?;
    Ok(default)
}

/// Overwrite `path` with the pretty-printed JSON of `value`.
pub fn save<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

/// A JSON document kept in memory and rewritten on every change.
#[derive(Debug)]
pub struct JsonFile<T> {
    path: PathBuf,
    value: T,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn open(path: PathBuf, default: T) -> Result<Self, StoreError> {
        let value = load_or_create(&path, default)?;
        Ok(Self { path, value })
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Apply `f` and persist the result.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let result = f(&mut self.value);
        save(&self.path, &self.value)?;
        Ok(result)
    }
}

/// Which markets the periodic tracker reports, and when it last did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    #[serde(default)]
    pub last: BTreeMap<String, DateTime<Utc>>,
    #[serde(flatten)]
    pub enabled: BTreeMap<String, bool>,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self {
            last: BTreeMap::new(),
            enabled: MarketId::ALL
                .iter()
                .map(|m| (m.as_str().to_string(), false))
                .collect(),
        }
    }
}

impl TrackingState {
    pub fn is_tracked(&self, market: MarketId) -> bool {
        self.enabled.get(market.as_str()).copied().unwrap_or(false)
    }

    /// Returns `true` if the flag changed.
    pub fn set_tracked(&mut self, market: MarketId, tracked: bool) -> bool {
        let previous = self.enabled.insert(market.as_str().to_string(), tracked);
        previous.unwrap_or(false) != tracked
    }

    pub fn tracked(&self) -> Vec<MarketId> {
        MarketId::ALL
            .into_iter()
            .filter(|m| self.is_tracked(*m))
            .collect()
    }

    pub fn mark_reported(&mut self, market: MarketId, at: DateTime<Utc>) {
        self.last.insert(market.as_str().to_string(), at);
    }
}

/// One reported observation of a market's total volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub market: MarketId,
    pub observed_at: DateTime<Utc>,
    pub total_volume: u64,
    /// `None` when no finite change could be computed
    pub change_pct: Option<f64>,
}

/// Append `record`, dropping the oldest entries beyond `max_entries`.
pub fn push_trend(history: &mut Vec<TrendRecord>, record: TrendRecord, max_entries: usize) {
    history.push(record);
    if history.len() > max_entries {
        let excess = history.len() - max_entries;
        history.drain(..excess);
    }
}
