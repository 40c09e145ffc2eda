//! IP geolocation cache management.
//!
//! A flat IP -> [`GeoRecord`] mapping persisted as one JSON file between runs.
//! Entries never expire: C2 infrastructure moves, but the geolocation of an
//! address does not change fast enough to matter for this dataset.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

use super::types::GeoRecord;

/// In-memory view of the on-disk geolocation cache.
#[derive(Debug, Default)]
pub struct GeoCache {
    entries: HashMap<String, GeoRecord>,
}

impl GeoCache {
    /// Loads the cache from disk.
    ///
    /// A missing or corrupt cache file is treated as an empty cache, never as
    /// a fatal error; corruption is logged and the file gets rewritten whole
    /// at the end of the run.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return GeoCache::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read geo cache {}: {e}. Starting empty.", path.display());
                return GeoCache::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => GeoCache { entries },
            Err(e) => {
                warn!("Geo cache {} is corrupt: {e}. Starting empty.", path.display());
                GeoCache::default()
            }
        }
    }

    /// Writes the cache back to disk, creating parent directories as needed.
    ///
    /// Called once at the end of a run, not per-record.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }

        let content =
            serde_json::to_string_pretty(&self.entries).context("Failed to serialize geo cache")?;
        std::fs::write(path, content).context("Failed to write geo cache file")?;

        Ok(())
    }

    /// Looks up the entry for `ip`.
    pub fn get(&self, ip: &str) -> Option<&GeoRecord> {
        self.entries.get(ip)
    }

    /// Whether `ip` already has an entry (resolved or not).
    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    /// Inserts or replaces the entry for `ip`.
    pub fn insert(&mut self, ip: String, record: GeoRecord) {
        self.entries.insert(ip, record);
    }

    /// Number of cached IPs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no IPs are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
