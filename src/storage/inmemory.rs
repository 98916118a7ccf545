//! Process-local session store.
//!
//! Entries live in a sharded `DashMap`. An expired entry stays in the map
//! until it is read or `purge_expired` sweeps it.

use super::KeyValueStore;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One stored blob and the instant it stops being readable.
struct SessionEntry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl SessionEntry {
    fn live_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// Session store kept in process memory, shared by all clones.
///
/// Expiry is measured on `tokio::time::Instant`, so a paused test clock
/// controls it.
///
/// # Example
///
/// ```no_run
/// use indastreet_kit::storage::{InMemoryStore, KeyValueStore};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///     store.set("shared_link_visit", b"v1".to_vec(), Some(Duration::from_secs(1800))).await?;
///     assert!(store.get("shared_link_visit").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, SessionEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.live_at(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("Purged {} expired session entries", purged);
        }
        purged
    }

    pub fn stats(&self) -> StoreStats {
        let now = Instant::now();
        let mut stats = StoreStats::default();
        for entry in self.entries.iter() {
            stats.total_entries += 1;
            stats.total_bytes += entry.bytes.len();
            if !entry.live_at(now) {
                stats.expired_entries += 1;
            }
        }
        stats
    }
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let bytes = match self.entries.get(key) {
            Some(entry) if entry.live_at(now) => Some(entry.bytes.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if bytes.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.live_at(now));
            debug!("Session entry {} expired", key);
        }
        Ok(bytes)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = SessionEntry {
            bytes: value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        debug!("Session entry {} written ({} bytes, ttl {:?})", key, entry.bytes.len(), ttl);
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            debug!("Session entry {} removed", key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self.entries.get(key).is_some_and(|entry| entry.live_at(now)))
    }

    async fn clear_all(&self) -> Result<()> {
        let dropped = self.entries.len();
        self.entries.clear();
        info!("Session store cleared, {} entries dropped", dropped);
        Ok(())
    }
}

/// Size figures for a session store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}
