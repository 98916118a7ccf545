//! Error types for the marketplace domain.

use std::fmt;

/// Result type for marketplace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the marketplace domain.
///
/// Display helpers (status, pricing, distance, countdown labels) never fail and
/// never produce these; they fall back to defaults instead. Everything that
/// mutates state or touches a store returns `Result<T>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input rejected before any state was touched.
    ///
    /// Raised when:
    /// - booking parameters are missing or non-positive
    /// - `Document::validate()` fails after loading
    /// - configuration values are out of range during `validate()`
    ValidationError(String),

    /// No document or booking with this id.
    NotFound(String),

    /// The booking state machine refused a transition.
    ///
    /// Terminal states (completed, cancelled, expired, failed) reject every
    /// transition; other states only allow the edges in the transition table.
    InvalidTransition {
        /// State the booking was in
        from: String,
        /// State that was requested
        to: String,
    },

    /// A provider tried to act on a booking addressed to someone else.
    ProviderMismatch {
        booking_id: String,
        provider_id: String,
    },

    /// The customer already has an open booking with this provider.
    ///
    /// Carries the id of the existing booking.
    DuplicateBooking(String),

    /// The response or confirmation deadline is already behind us.
    DeadlinePassed(String),

    /// Document repository failure (database, remote collection, etc).
    ///
    /// **Recovery:** Retry after connection recovery.
    RepositoryError(String),

    /// Session store failure.
    StorageError(String),

    /// Converting a value to stored bytes failed.
    SerializationError(String),

    /// Stored bytes could not be decoded.
    ///
    /// **Recovery:** Drop the stored entry; it is rebuilt on the next persist.
    DeserializationError(String),

    /// Stored snapshot has a bad magic header.
    InvalidSnapshot(String),

    /// Snapshot schema version differs from the compiled one.
    ///
    /// Expected after deployments that change booking fields. The stale
    /// snapshot is discarded.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from stored snapshot)
        found: u32,
    },

    /// Configuration error, e.g. an unparseable environment override.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::NotFound(id) => write!(f, "Not found: {}", id),
            Error::InvalidTransition { from, to } => {
                write!(f, "Invalid transition from {} to {}", from, to)
            }
            Error::ProviderMismatch {
                booking_id,
                provider_id,
            } => write!(
                f,
                "Provider {} does not own booking {}",
                provider_id, booking_id
            ),
            Error::DuplicateBooking(id) => {
                write!(f, "Duplicate booking: {} is still open", id)
            }
            Error::DeadlinePassed(msg) => write!(f, "Deadline passed: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::StorageError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
