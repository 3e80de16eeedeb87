//! Records the local store persists.

use crate::error::Result;
use crate::model::{Bill, Customer};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Trait for records kept in a [`StoreBackend`](crate::backend::StoreBackend).
///
/// The final storage key is `"{prefix}:{key}"`.
///
/// # Example
///
/// ```
/// use bill_kit::entity::StoredEntity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Attendance {
///     employee_id: String,
///     date: String,
/// }
///
/// impl StoredEntity for Attendance {
///     type Key = String;
///
///     fn storage_key(&self) -> Self::Key {
///         format!("{}:{}", self.employee_id, self.date)
///     }
///
///     fn storage_prefix() -> &'static str {
///         "attendance"
///     }
/// }
/// ```
pub trait StoredEntity: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone {
    type Key: Display + Clone + Send + Sync;

    /// Return the record's key within its prefix.
    fn storage_key(&self) -> Self::Key;

    /// Namespace for this record type.
    fn storage_prefix() -> &'static str;

    /// Encode with the versioned envelope. See `crate::serialization`.
    fn encode(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_for_store(self)
    }

    /// Decode and validate the envelope.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidEntry`: Bad magic or corrupted envelope
    /// - `Error::VersionMismatch`: Schema version changed
    /// - `Error::DeserializationError`: Corrupted payload
    fn decode(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_from_store(bytes)
    }
}

/// Customers are keyed by phone, which makes phone the dedup key.
impl StoredEntity for Customer {
    type Key = String;

    fn storage_key(&self) -> Self::Key {
        self.phone.clone()
    }

    fn storage_prefix() -> &'static str {
        "customer"
    }
}

impl StoredEntity for Bill {
    type Key = String;

    fn storage_key(&self) -> Self::Key {
        self.id.clone()
    }

    fn storage_prefix() -> &'static str {
        "bill"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_customer_encode_decode() {
        let customer = Customer {
            id: "c-1".to_string(),
            name: "Asha Verma".to_string(),
            phone: "9876543210".to_string(),
            created_at: Utc::now(),
        };

        let bytes = customer.encode().unwrap();
        let decoded = Customer::decode(&bytes).unwrap();

        assert_eq!(decoded, customer);
        assert_eq!(decoded.storage_key(), "9876543210");
        assert_eq!(Customer::storage_prefix(), "customer");
    }
}
