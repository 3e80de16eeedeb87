//! Bill submission trait for persisting finalized bills.

use crate::error::Result;
use crate::model::{Bill, BillPayload};

/// Trait for bill submission implementations.
///
/// The wizard calls `create` at most once per explicit submit action and
/// passes the same `idempotency_key` on every retry of the same draft.
/// Implementations that can dedup on the key should return the bill created
/// by the first successful call; others may ignore it and issue a fresh bill
/// number per call.
#[allow(async_fn_in_trait)]
pub trait BillSubmission: Send + Sync {
    /// Persist a bill and return it with its generated id and number.
    ///
    /// # Errors
    /// Returns `Err` if the bill could not be stored.
    async fn create(&self, payload: &BillPayload, idempotency_key: &str) -> Result<Bill>;
}

impl<T: BillSubmission> BillSubmission for std::sync::Arc<T> {
    async fn create(&self, payload: &BillPayload, idempotency_key: &str) -> Result<Bill> {
        (**self).create(payload, idempotency_key).await
    }
}
