//! Document repository trait for abstracting the backend collections.
//!
//! The marketplace reads providers, menus and reviews from a document store
//! and writes bookings back to it. `DocumentRepository` hides which store that
//! is, so the booking engine and the listing service can run against a remote
//! collection in production and against `InMemoryRepository` in tests.
//!
//! # Error Handling
//!
//! When implementing the trait for a real store, return `Err` for:
//! - Connectivity issues and timeouts
//! - Permission failures
//! - Malformed documents returned by the store
//!
//! A missing document is `Ok(None)`, not an error.

use crate::entity::Document;
use crate::error::{Error, Result};
use crate::key::DocumentKey;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

/// Trait for document repository implementations.
///
/// All methods take `&self`; implementations use interior mutability so one
/// repository can be shared by the engine's background expiry tasks.
/// Returned futures are `Send` so they can be awaited from spawned tasks.
pub trait DocumentRepository<T: Document>: Send + Sync {
    /// Fetch a document by id.
    ///
    /// # Returns
    /// - `Ok(Some(doc))` - Document found
    /// - `Ok(None)` - Document not found (not an error)
    /// - `Err(e)` - Store error
    fn fetch_by_id(&self, id: &T::Id) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Insert or replace a document under its own id.
    fn upsert(&self, document: T) -> impl Future<Output = Result<()>> + Send;

    /// Remove a document. Removing a missing document is not an error.
    fn delete(&self, id: &T::Id) -> impl Future<Output = Result<()>> + Send;

    /// Batch fetch documents by ids.
    ///
    /// Default implementation calls `fetch_by_id()` for each id.
    fn fetch_by_ids(&self, ids: &[T::Id]) -> impl Future<Output = Result<Vec<Option<T>>>> + Send {
        async move {
            let mut results = Vec::with_capacity(ids.len());
            for id in ids {
                results.push(self.fetch_by_id(id).await?);
            }
            Ok(results)
        }
    }

    /// Count documents in the collection (optional).
    fn count(&self) -> impl Future<Output = Result<u64>> + Send {
        async {
            Err(Error::Other(format!(
                "count not implemented for collection {}",
                T::collection()
            )))
        }
    }

    /// Get every document in the collection (optional, potentially large).
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>>> + Send {
        async {
            Err(Error::Other(format!(
                "fetch_all not implemented for collection {}",
                T::collection()
            )))
        }
    }
}

// ============================================================================
// In-Memory Repository
// ============================================================================

/// In-memory repository backed by a sharded `DashMap`, keyed `collection:id`.
///
/// Clones share the same underlying map, so a clone handed to the booking
/// engine sees documents inserted through the original.
///
/// # Example
///
/// ```ignore
/// let providers = InMemoryRepository::new();
/// providers.insert(provider.clone());
///
/// let found = providers.fetch_by_id(&provider.id).await?;
/// assert!(found.is_some());
/// ```
pub struct InMemoryRepository<T: Document> {
    data: Arc<DashMap<String, T>>,
}

impl<T: Document> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        InMemoryRepository {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Document> InMemoryRepository<T> {
    /// Create a new empty repository.
    pub fn new() -> Self {
        InMemoryRepository {
            data: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace a document synchronously (fixtures, seeding).
    pub fn insert(&self, document: T) {
        let key = DocumentKey::build::<T>(&document.document_id());
        self.data.insert(key, document);
    }

    /// Remove all documents.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Return the number of documents.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return true if the repository holds no documents.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Document> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> DocumentRepository<T> for InMemoryRepository<T> {
    async fn fetch_by_id(&self, id: &T::Id) -> Result<Option<T>> {
        let key = DocumentKey::build::<T>(id);
        Ok(self.data.get(&key).map(|doc| doc.clone()))
    }

    async fn upsert(&self, document: T) -> Result<()> {
        document.validate()?;
        let key = DocumentKey::build::<T>(&document.document_id());
        debug!("Document {} stored", key);
        self.data.insert(key, document);
        Ok(())
    }

    async fn delete(&self, id: &T::Id) -> Result<()> {
        let key = DocumentKey::build::<T>(id);
        self.data.remove(&key);
        debug!("Document {} deleted", key);
        Ok(())
    }

    async fn fetch_by_ids(&self, ids: &[T::Id]) -> Result<Vec<Option<T>>> {
        Ok(ids
            .iter()
            .map(|id| {
                self.data
                    .get(&DocumentKey::build::<T>(id))
                    .map(|doc| doc.clone())
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        Ok(self.data.iter().map(|entry| entry.value().clone()).collect())
    }
}
