use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::FormResult;
use crate::utils::{paths, write_atomic};

use super::CatalogItem;

/// Storage key of the persisted catalog.
pub const CACHE_KEY: &str = "inventory_items_cache";
pub const DEFAULT_EXPIRY_MINUTES: i64 = 30;

/// Persisted catalog snapshot. `timestamp` is in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCatalog {
    pub items: Vec<CatalogItem>,
    pub timestamp: i64,
}

impl CachedCatalog {
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Whole minutes since the snapshot was taken.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        ((now.timestamp_millis() - self.timestamp) / 60_000).max(0)
    }
}

/// File-backed cache of the whole item catalog.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
    expiry: Duration,
    entry: Option<CachedCatalog>,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>, expiry_minutes: i64) -> Self {
        Self {
            path: path.into(),
            expiry: Duration::minutes(expiry_minutes),
            entry: None,
        }
    }

    /// Cache stored as `<base>/cache/<key>.json`.
    pub fn in_dir(base: &Path, key: &str, expiry_minutes: i64) -> Self {
        Self::new(paths::cache_file_in(base, key), expiry_minutes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self) -> Option<&CachedCatalog> {
        self.entry.as_ref()
    }

    pub fn items(&self) -> Option<&[CatalogItem]> {
        self.entry.as_ref().map(|entry| entry.items.as_slice())
    }

    /// Reads the snapshot from disk. Expired or unreadable snapshots are
    /// ignored so the next lookup fetches fresh data.
    pub fn load(&mut self, now: DateTime<Utc>) -> FormResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<CachedCatalog>(&data) {
            Ok(entry) if self.is_expired(&entry, now) => {
                debug!(path = %self.path.display(), "catalog cache expired");
                self.entry = None;
            }
            Ok(entry) => {
                debug!(items = entry.items.len(), "catalog cache loaded");
                self.entry = Some(entry);
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable catalog cache");
                self.entry = None;
            }
        }
        Ok(())
    }

    /// Replaces the in-memory snapshot, then writes it to disk.
    pub fn store(&mut self, items: Vec<CatalogItem>, now: DateTime<Utc>) -> FormResult<()> {
        let entry = CachedCatalog {
            items,
            timestamp: now.timestamp_millis(),
        };
        let data = serde_json::to_string(&entry)?;
        let count = entry.items.len();
        self.entry = Some(entry);
        write_atomic(&self.path, &data)?;
        info!(items = count, path = %self.path.display(), "catalog cache saved");
        Ok(())
    }

    /// True when a snapshot exists and is younger than the expiry window.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| !self.is_expired(entry, now))
    }

    fn is_expired(&self, entry: &CachedCatalog, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - entry.timestamp > self.expiry.num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let mut cache = CatalogCache::in_dir(temp.path(), CACHE_KEY, DEFAULT_EXPIRY_MINUTES);
        cache
            .store(vec![CatalogItem::new("A1", "Widget")], at(0))
            .unwrap();

        let mut reloaded = CatalogCache::in_dir(temp.path(), CACHE_KEY, DEFAULT_EXPIRY_MINUTES);
        reloaded.load(at(10)).unwrap();
        assert_eq!(reloaded.items().map(<[CatalogItem]>::len), Some(1));
        assert_eq!(reloaded.entry().unwrap().age_minutes(at(10)), 10);
        assert!(reloaded.is_fresh(at(10)));
    }

    #[test]
    fn expired_snapshot_is_dropped_on_load() {
        let temp = TempDir::new().unwrap();
        let mut cache = CatalogCache::in_dir(temp.path(), CACHE_KEY, 30);
        cache.store(vec![CatalogItem::new("A1", "Widget")], at(0)).unwrap();
        assert!(!cache.is_fresh(at(31)));

        let mut reloaded = CatalogCache::in_dir(temp.path(), CACHE_KEY, 30);
        reloaded.load(at(31)).unwrap();
        assert!(reloaded.entry().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        let mut cache = CatalogCache::in_dir(temp.path(), CACHE_KEY, 30);
        write_atomic(cache.path(), "{not json").unwrap();
        cache.load(at(0)).unwrap();
        assert!(cache.entry().is_none());
    }
}
