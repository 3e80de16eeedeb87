//! Storage key management utilities.

use crate::entity::StoredEntity;

/// Prefix of idempotency-key index entries.
pub const IDEMPOTENCY_PREFIX: &str = "bill-key";

/// Builder for storage keys.
pub struct StorageKeyBuilder;

impl StorageKeyBuilder {
    /// Build full storage key from entity type and key.
    pub fn build<T: StoredEntity>(id: &T::Key) -> String {
        format!("{}:{}", T::storage_prefix(), id)
    }

    /// Prefix shared by every key of an entity type.
    pub fn prefix<T: StoredEntity>() -> String {
        format!("{}:", T::storage_prefix())
    }

    /// Key of the index entry mapping an idempotency key to a bill id.
    pub fn idempotency(key: &str) -> String {
        format!("{}:{}", IDEMPOTENCY_PREFIX, key)
    }
}
