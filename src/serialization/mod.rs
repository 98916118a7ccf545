//! Postcard snapshots with versioned envelopes.
//!
//! Everything written to the session store goes through this module. Each
//! snapshot is wrapped in an envelope so stale or foreign bytes are rejected
//! instead of being decoded into garbage after a deployment.
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "INDA"              u32                postcard::to_allocvec(T)
//! ```
//!
//! # Example
//!
//! ```rust
//! use indastreet_kit::serialization::{encode_snapshot, decode_snapshot};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct LastSearch {
//!     city: String,
//!     radius_km: u32,
//! }
//!
//! # fn main() -> indastreet_kit::Result<()> {
//! let search = LastSearch { city: "Ubud".to_string(), radius_km: 5 };
//! let bytes = encode_snapshot(&search)?;
//! let restored: LastSearch = decode_snapshot(&bytes)?;
//! assert_eq!(search, restored);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for snapshots: b"INDA"
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"INDA";

/// Current snapshot schema version.
///
/// Increment when a stored type changes shape (fields added, removed,
/// reordered or retyped; enum variants changed). Old snapshots are then
/// rejected with `Error::VersionMismatch` and discarded by callers.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around a snapshot payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotEnvelope<T> {
    /// Magic header: must be b"INDA"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The stored value
    pub payload: T,
}

impl<T> SnapshotEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value into an enveloped snapshot.
///
/// # Errors
///
/// Returns `Error::SerializationError` if postcard encoding fails.
pub fn encode_snapshot<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = SnapshotEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Snapshot serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode an enveloped snapshot, checking magic and version.
///
/// # Errors
///
/// - `Error::InvalidSnapshot`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
/// - `Error::DeserializationError`: Corrupted postcard payload
pub fn decode_snapshot<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: SnapshotEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Snapshot deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != SNAPSHOT_MAGIC {
        warn!(
            "Invalid snapshot: expected magic {:?}, got {:?}",
            SNAPSHOT_MAGIC, envelope.magic
        );
        return Err(Error::InvalidSnapshot(format!(
            "Invalid magic: expected {:?}, got {:?}",
            SNAPSHOT_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Snapshot version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
