//! Session store: the key/value persistence behind booking snapshots.
//!
//! Plays the role browser `localStorage` / `sessionStorage` play for the web
//! client: small blobs under string keys, optionally expiring. Values are raw
//! bytes; typed values go through `crate::serialization` first.

use crate::error::Result;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::{InMemoryStore, StoreStats};

/// Trait for session store implementations.
///
/// All methods use `&self`; implementations rely on interior mutability.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore: Send + Sync + Clone {
    /// Retrieve a value by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value present and not expired
    /// - `Ok(None)` - Key absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value with optional TTL. `None` keeps it until deleted.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove a value.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a live value exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove everything (logout, "clear site data").
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::StorageError(
            "clear_all not supported by this store".to_string(),
        ))
    }
}
