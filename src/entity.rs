//! Core document trait implemented by everything kept in a collection.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;

/// Trait that all documents stored in a collection must implement.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use indastreet_kit::Document;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Review {
///     pub id: String,
///     pub rating: u8,
/// }
///
/// impl Document for Review {
///     type Id = String;
///
///     fn document_id(&self) -> Self::Id {
///         self.id.clone()
///     }
///
///     fn collection() -> &'static str {
///         "reviews"
///     }
/// }
/// ```
pub trait Document: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone {
    /// Type of the document id (typically String or UUID)
    type Id: Display + Clone + Send + Sync + Eq + Hash + 'static;

    /// Return the document's unique id.
    fn document_id(&self) -> Self::Id;

    /// Return the collection this document type lives in.
    ///
    /// Final storage key format: `"{collection}:{id}"`
    fn collection() -> &'static str;

    /// Encode the document for the session store.
    ///
    /// Uses the versioned postcard envelope from `crate::serialization`.
    fn to_snapshot(&self) -> Result<Vec<u8>> {
        crate::serialization::encode_snapshot(self)
    }

    /// Decode a document previously written by `to_snapshot`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidSnapshot`: Bad magic
    /// - `Error::VersionMismatch`: Schema version changed
    /// - `Error::DeserializationError`: Corrupted payload
    fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        crate::serialization::decode_snapshot(bytes)
    }

    /// Optional: Validate the document after loading.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
