//! Customer directory trait for resolving phone numbers to customers.
//!
//! The `CustomerDirectory` trait decouples the wizard from where customers
//! live. Two implementations ship with the crate:
//! - [`LocalDirectory`](crate::local::LocalDirectory): any
//!   [`StoreBackend`](crate::backend::StoreBackend), in-memory by default
//! - `HttpDirectory` (feature `http`): the billing REST API
//!
//! # Implementing CustomerDirectory
//!
//! ```ignore
//! use bill_kit::directory::CustomerDirectory;
//! use bill_kit::model::{Customer, CustomerLookup};
//! use bill_kit::Result;
//!
//! struct SqlDirectory { pool: sqlx::PgPool }
//!
//! impl CustomerDirectory for SqlDirectory {
//!     async fn find_by_phone(&self, phone: &str) -> Result<CustomerLookup> {
//!         // SELECT ... WHERE phone = $1
//!         # unimplemented!()
//!     }
//!
//!     async fn upsert(&self, name: &str, phone: &str) -> Result<Customer> {
//!         // INSERT ... ON CONFLICT (phone) DO UPDATE SET name = $1
//!         # unimplemented!()
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! "Not found" is never an error. Return `Err` only for transport or storage
//! failures; the wizard maps those according to its
//! [`LookupFailurePolicy`](crate::strategy::LookupFailurePolicy).

use crate::error::Result;
use crate::model::{Customer, CustomerLookup};

/// Trait for customer directory implementations.
///
/// Phone is the dedup key: at most one customer per phone value. Phones are
/// normalized with `trim()` only.
#[allow(async_fn_in_trait)]
pub trait CustomerDirectory: Send + Sync {
    /// Resolve a phone number.
    ///
    /// # Returns
    /// - `Ok(CustomerLookup { exists: true, .. })` - Customer found
    /// - `Ok(CustomerLookup { exists: false, .. })` - New customer
    ///
    /// # Errors
    /// Returns `Err` if the directory is unreachable or the lookup fails.
    async fn find_by_phone(&self, phone: &str) -> Result<CustomerLookup>;

    /// Create or update the customer for `phone`.
    ///
    /// An existing record keeps its id; its name is replaced if it changed.
    /// A new record gets a generated id and the current timestamp.
    ///
    /// # Errors
    /// Returns `Err` if the directory is unreachable or the write fails.
    async fn upsert(&self, name: &str, phone: &str) -> Result<Customer>;

    /// Health check - verify the directory is reachable.
    ///
    /// # Errors
    /// Returns `Err` if the directory is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

impl<T: CustomerDirectory> CustomerDirectory for std::sync::Arc<T> {
    async fn find_by_phone(&self, phone: &str) -> Result<CustomerLookup> {
        (**self).find_by_phone(phone).await
    }

    async fn upsert(&self, name: &str, phone: &str) -> Result<Customer> {
        (**self).upsert(name, phone).await
    }

    async fn health_check(&self) -> Result<bool> {
        (**self).health_check().await
    }
}
