//! Postcard-based record serialization with versioned envelopes.
//!
//! Every value written to a [`StoreBackend`](crate::backend::StoreBackend) by
//! the local collaborators is wrapped in an envelope:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "JBIL"              u32 (varint)       postcard::to_allocvec(T)
//! ```
//!
//! A bad magic or a version mismatch is reported as an error here; the
//! local collaborators log it and read the record as absent.
//!
//! # Example
//!
//! ```rust
//! use bill_kit::serialization::{serialize_for_store, deserialize_from_store};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Note {
//!     id: u64,
//!     text: String,
//! }
//!
//! # fn main() -> bill_kit::Result<()> {
//! let note = Note { id: 1, text: "deliver Friday".to_string() };
//!
//! let bytes = serialize_for_store(&note)?;
//! let decoded: Note = deserialize_from_store(&bytes)?;
//! assert_eq!(note, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for stored records: b"JBIL"
pub const STORE_MAGIC: [u8; 4] = *b"JBIL";

/// Current schema version.
///
/// Increment when a stored type changes shape (fields added, removed,
/// reordered or retyped, enum variants changed). Records written under an
/// older version then read as absent.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for stored records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreEnvelope<T> {
    /// Magic header: must be b"JBIL"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    pub payload: T,
}

impl<T> StoreEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: STORE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a value with envelope for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_for_store<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = StoreEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Record serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from storage with validation.
///
/// # Errors
///
/// - `Error::InvalidEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
/// - `Error::DeserializationError`: Corrupted Postcard payload
pub fn deserialize_from_store<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: StoreEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Record deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != STORE_MAGIC {
        warn!(
            "Invalid stored record: expected magic {:?}, got {:?}",
            STORE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            STORE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Stored record version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
