use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::data::types::MarketId;
use crate::storage::persistence::{load_or_create, save, StoreError};

/// Last observed total volume per market.
pub trait BaselineStore: Send + Sync {
    fn get(&self, market: MarketId) -> Option<u64>;

    /// Replace the baseline for `market`.
    fn set(&self, market: MarketId, volume: u64) -> Result<(), StoreError>;
}

/// Baselines held only in memory.
#[derive(Debug, Default)]
pub struct MemoryBaselineStore {
    volumes: DashMap<MarketId, u64>,
}

impl MemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(entries: &[(MarketId, u64)]) -> Self {
        let store = Self::new();
        for &(market, volume) in entries {
            store.volumes.insert(market, volume);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn get(&self, market: MarketId) -> Option<u64> {
        self.volumes.get(&market).map(|v| *v)
    }

    fn set(&self, market: MarketId, volume: u64) -> Result<(), StoreError> {
        self.volumes.insert(market, volume);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VolumeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last: Option<u64>,
}

/// Baselines persisted as `{"london": {"last": 1100}, "nyc": {}}`.
///
/// The whole file is rewritten on every `set`; unknown keys are carried over.
#[derive(Debug)]
pub struct JsonBaselineStore {
    path: PathBuf,
    entries: DashMap<String, VolumeEntry>,
}

impl JsonBaselineStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let default: BTreeMap<String, VolumeEntry> = MarketId::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), VolumeEntry::default()))
            .collect();

        let loaded = load_or_create(&path, default)?;
        Ok(Self {
            path,
            entries: loaded.into_iter().collect(),
        })
    }

    fn snapshot(&self) -> BTreeMap<String, VolumeEntry> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

impl BaselineStore for JsonBaselineStore {
    fn get(&self, market: MarketId) -> Option<u64> {
        self.entries.get(market.as_str()).and_then(|e| e.last)
    }

    fn set(&self, market: MarketId, volume: u64) -> Result<(), StoreError> {
        let key = market.as_str().to_string();
        let entry = VolumeEntry { last: Some(volume) };

        // Memory only changes once the file write succeeded
        let mut snapshot = self.snapshot();
        snapshot.insert(key.clone(), entry.clone());
        save(&self.path, &snapshot)?;

        self.entries.insert(key, entry);
        Ok(())
    }
}
