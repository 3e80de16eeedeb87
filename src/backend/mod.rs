//! Key-value store backends for local persistence.
//!
//! The local collaborators ([`LocalDirectory`](crate::local::LocalDirectory),
//! [`LocalBillStore`](crate::local::LocalBillStore)) keep their records in a
//! `StoreBackend`. This is the stand-in for the browser's local storage; it is
//! a stub for offline use and tests, not a persistence engine.

use crate::error::Result;

pub mod inmemory;

pub use inmemory::{InMemoryStore, StoreStats};

/// Trait for key-value store implementations.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow
/// shared access. Implementations use interior mutability and are expected to
/// serialize their own writes.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait StoreBackend: Send + Sync + Clone {
    /// Retrieve value by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value present
    /// - `Ok(None)` - Key not found
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove value.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys starting with `prefix`, in no particular order.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if key exists.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Optional: Remove everything (use with caution).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::Other(
            "clear_all not supported by this backend".to_string(),
        ))
    }
}
