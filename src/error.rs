//! Error types for bill computation, the wizard and its collaborators.

use crate::wizard::Step;
use std::fmt;

/// Result type for billing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Draft field a validation failure is attached to.
///
/// UIs use this to mark the offending control as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Phone,
    CustomerName,
    BillType,
    Items,
    ItemName(usize),
    ItemPrice(usize),
    ItemIndex(usize),
    TaxRate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Phone => write!(f, "phone"),
            Field::CustomerName => write!(f, "customer name"),
            Field::BillType => write!(f, "bill type"),
            Field::Items => write!(f, "items"),
            Field::ItemName(i) => write!(f, "item {} name", i + 1),
            Field::ItemPrice(i) => write!(f, "item {} price", i + 1),
            Field::ItemIndex(i) => write!(f, "item {}", i + 1),
            Field::TaxRate => write!(f, "tax rate"),
        }
    }
}

/// Error types for the billing crate.
///
/// Validation errors never involve I/O: the wizard stays where it is and
/// the caller marks `field` as invalid. Collaborator failures are translated
/// into `LookupError`, `SubmissionError` or `Timeout` at the call site.
#[derive(Debug, Clone)]
pub enum Error {
    /// A transition guard or an input check failed.
    ValidationError {
        /// Control the message belongs to
        field: Field,
        /// Human-readable message
        message: String,
    },

    /// Operation is not available in the current wizard step.
    InvalidStep {
        /// Operation that was attempted
        operation: &'static str,
        /// Step the wizard was in
        step: Step,
    },

    /// Customer directory lookup failed at the transport level.
    ///
    /// Only surfaced when the lookup failure policy is `Block`; the default
    /// policy treats the customer as new and keeps a soft warning instead.
    LookupError(String),

    /// Bill submission failed.
    ///
    /// **Recovery:** The wizard stays in Review; the user may submit again.
    SubmissionError(String),

    /// A collaborator call exceeded its configured timeout.
    ///
    /// **Recovery:** Retry the same action.
    Timeout(String),

    /// Storage or transport error from a collaborator implementation.
    BackendError(String),

    /// Encoding a value for storage or the wire failed.
    SerializationError(String),

    /// Decoding stored or received bytes failed.
    DeserializationError(String),

    /// Stored entry has a bad magic header or a corrupted envelope.
    InvalidEntry(String),

    /// Stored entry was written under a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from the stored entry)
        found: u32,
    },

    /// Invalid configuration value.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    pub(crate) fn validation(field: Field, message: impl Into<String>) -> Self {
        Error::ValidationError {
            field,
            message: message.into(),
        }
    }

    /// True for errors the user can clear by simply trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::SubmissionError(_) | Error::LookupError(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationError { field, message } => {
                write!(f, "Validation error ({}): {}", field, message)
            }
            Error::InvalidStep { operation, step } => {
                write!(f, "Cannot {} in step {}", operation, step)
            }
            Error::LookupError(msg) => write!(f, "Customer lookup failed: {}", msg),
            Error::SubmissionError(msg) => write!(f, "Bill submission failed: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidEntry(msg) => write!(f, "Invalid stored entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Stored entry version mismatch: expected {}, found {}",
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
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
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

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(format!("HTTP request timed out: {}", e))
        } else if e.is_decode() {
            Error::DeserializationError(format!("HTTP response body: {}", e))
        } else {
            Error::BackendError(format!("HTTP error: {}", e))
        }
    }
}
