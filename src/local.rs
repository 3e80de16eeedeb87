//! Local collaborators backed by a [`StoreBackend`].
//!
//! These replace the browser local-storage mock of the billing front-end:
//! customers and bills live in a key-value store, records that cannot be
//! decoded are logged and read as absent, and ids are generated locally.
//!
//! ```no_run
//! use bill_kit::backend::InMemoryStore;
//! use bill_kit::local::{LocalBillStore, LocalDirectory};
//! use bill_kit::WizardStateMachine;
//!
//! let store = InMemoryStore::new();
//! let wizard = WizardStateMachine::new(
//!     LocalDirectory::new(store.clone()),
//!     LocalBillStore::new(store),
//! );
//! ```

use crate::backend::StoreBackend;
use crate::directory::CustomerDirectory;
use crate::entity::StoredEntity;
use crate::error::Result;
use crate::key::StorageKeyBuilder;
use crate::model::{generate_bill_number, Bill, BillPayload, Customer, CustomerLookup};
use crate::serialization::{deserialize_from_store, serialize_for_store};
use crate::submission::BillSubmission;
use chrono::Utc;
use uuid::Uuid;

/// Read and decode one record, treating undecodable bytes as absent.
async fn read_record<T, B>(store: &B, key: &str) -> Result<Option<T>>
where
    T: StoredEntity,
    B: StoreBackend,
{
    match store.get(key).await? {
        None => Ok(None),
        Some(bytes) => match T::decode(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Ignoring unreadable record {}: {}", key, e);
                Ok(None)
            }
        },
    }
}

async fn write_record<T, B>(store: &B, record: &T) -> Result<()>
where
    T: StoredEntity,
    B: StoreBackend,
{
    let key = StorageKeyBuilder::build::<T>(&record.storage_key());
    store.set(&key, record.encode()?).await
}

async fn read_all<T, B>(store: &B) -> Result<Vec<T>>
where
    T: StoredEntity,
    B: StoreBackend,
{
    let mut records = Vec::new();
    for key in store.keys_with_prefix(&StorageKeyBuilder::prefix::<T>()).await? {
        if let Some(record) = read_record::<T, B>(store, &key).await? {
            records.push(record);
        }
    }
    Ok(records)
}

// ============================================================================
// Customers
// ============================================================================

/// Customer directory over a key-value store, keyed by trimmed phone.
#[derive(Clone)]
pub struct LocalDirectory<B: StoreBackend> {
    store: B,
}

impl<B: StoreBackend> LocalDirectory<B> {
    pub fn new(store: B) -> Self {
        LocalDirectory { store }
    }

    /// All customers, oldest first.
    ///
    /// # Errors
    /// Returns `Err` if the store fails
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> = read_all(&self.store).await?;
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(customers)
    }

    async fn read_customer(&self, phone: &str) -> Result<Option<Customer>> {
        let key = StorageKeyBuilder::build::<Customer>(&phone.to_string());
        read_record(&self.store, &key).await
    }
}

impl<B: StoreBackend> CustomerDirectory for LocalDirectory<B> {
    async fn find_by_phone(&self, phone: &str) -> Result<CustomerLookup> {
        match self.read_customer(phone.trim()).await? {
            Some(customer) => Ok(CustomerLookup::found(customer)),
            None => Ok(CustomerLookup::not_found()),
        }
    }

    async fn upsert(&self, name: &str, phone: &str) -> Result<Customer> {
        let phone = phone.trim();
        let name = name.trim();

        if let Some(mut existing) = self.read_customer(phone).await? {
            if existing.name != name {
                debug!("Renaming customer {} ({} -> {})", existing.id, existing.name, name);
                existing.name = name.to_string();
                write_record(&self.store, &existing).await?;
            }
            return Ok(existing);
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            created_at: Utc::now(),
        };
        write_record(&self.store, &customer).await?;
        info!("Created customer {}", customer.id);
        Ok(customer)
    }

    async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }
}

// ============================================================================
// Bills
// ============================================================================

/// Bill store over a key-value store.
///
/// A repeated idempotency key returns the bill stored by the first call.
#[derive(Clone)]
pub struct LocalBillStore<B: StoreBackend> {
    store: B,
}

impl<B: StoreBackend> LocalBillStore<B> {
    pub fn new(store: B) -> Self {
        LocalBillStore { store }
    }

    /// # Errors
    /// Returns `Err` if the store fails
    pub async fn get_bill(&self, id: &str) -> Result<Option<Bill>> {
        let key = StorageKeyBuilder::build::<Bill>(&id.to_string());
        read_record(&self.store, &key).await
    }

    /// All bills, newest first.
    ///
    /// # Errors
    /// Returns `Err` if the store fails
    pub async fn list_bills(&self) -> Result<Vec<Bill>> {
        let mut bills: Vec<Bill> = read_all(&self.store).await?;
        bills.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bills)
    }

    async fn replayed(&self, idempotency_key: &str) -> Result<Option<Bill>> {
        let index_key = StorageKeyBuilder::idempotency(idempotency_key);
        let Some(bytes) = self.store.get(&index_key).await? else {
            return Ok(None);
        };
        match deserialize_from_store::<String>(&bytes) {
            Ok(bill_id) => self.get_bill(&bill_id).await,
            Err(e) => {
                warn!("Ignoring unreadable index {}: {}", index_key, e);
                Ok(None)
            }
        }
    }
}

impl<B: StoreBackend> BillSubmission for LocalBillStore<B> {
    async fn create(&self, payload: &BillPayload, idempotency_key: &str) -> Result<Bill> {
        if !idempotency_key.is_empty() {
            if let Some(bill) = self.replayed(idempotency_key).await? {
                info!("Returning bill {} for repeated submission", bill.bill_number);
                return Ok(bill);
            }
        }

        let now = Utc::now();
        let bill = Bill::from_payload(
            Uuid::new_v4().to_string(),
            generate_bill_number(now),
            payload,
            now,
        );
        write_record(&self.store, &bill).await?;

        if !idempotency_key.is_empty() {
            let index_key = StorageKeyBuilder::idempotency(idempotency_key);
            self.store
                .set(&index_key, serialize_for_store(&bill.id)?)
                .await?;
        }

        info!("Stored bill {} ({})", bill.bill_number, bill.id);
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryStore;
    use crate::model::{BillItem, BillType, Material, PaymentMethod, ProductLine};

    fn payload(customer_id: &str) -> BillPayload {
        BillPayload {
            customer_id: Some(customer_id.to_string()),
            customer_name: "Asha Verma".to_string(),
            customer_phone: "9876543210".to_string(),
            jewelry_type: Material::Gold,
            bill_type: BillType::White,
            products: vec![ProductLine::from(&BillItem::new("Gold Ring", 15000.0))],
            cgst_rate: 1.5,
            sgst_rate: 1.5,
            payment_method: PaymentMethod::Upi,
        }
    }

    #[tokio::test]
    async fn test_find_by_phone_miss_is_not_an_error() {
        let directory = LocalDirectory::new(InMemoryStore::new());
        let lookup = directory.find_by_phone("9876543210").await.unwrap();
        assert!(!lookup.exists);
        assert!(lookup.customer.is_none());
    }

    #[tokio::test]
    async fn test_upsert_dedups_on_trimmed_phone() {
        let directory = LocalDirectory::new(InMemoryStore::new());

        let first = directory.upsert(" Asha ", "9876543210").await.unwrap();
        assert_eq!(first.name, "Asha");

        let second = directory
            .upsert("Asha Verma", " 9876543210 ")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Asha Verma");
        assert_eq!(second.created_at, first.created_at);

        let lookup = directory.find_by_phone("9876543210").await.unwrap();
        assert_eq!(lookup.customer.unwrap().name, "Asha Verma");
        assert_eq!(directory.list_customers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_customer_reads_as_absent() {
        let store = InMemoryStore::new();
        store
            .set("customer:9876543210", b"not an envelope".to_vec())
            .await
            .unwrap();

        let directory = LocalDirectory::new(store);
        let lookup = directory.find_by_phone("9876543210").await.unwrap();
        assert!(!lookup.exists);
    }

    #[tokio::test]
    async fn test_create_bill_and_list() {
        let bills = LocalBillStore::new(InMemoryStore::new());

        let bill = bills.create(&payload("c1"), "k1").await.unwrap();
        assert!(bill.bill_number.starts_with("BILL-"));
        assert_eq!(bill.customer_id.as_deref(), Some("c1"));
        assert!((bill.totals.total - 15450.0).abs() < 1e-6);

        let stored = bills.get_bill(&bill.id).await.unwrap().unwrap();
        assert_eq!(stored, bill);
        assert_eq!(bills.list_bills().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_idempotency_key_returns_same_bill() {
        let bills = LocalBillStore::new(InMemoryStore::new());

        let first = bills.create(&payload("c1"), "same-key").await.unwrap();
        let second = bills.create(&payload("c1"), "same-key").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(bills.list_bills().await.unwrap().len(), 1);

        let third = bills.create(&payload("c1"), "other-key").await.unwrap();
        assert_ne!(third.id, first.id);
        assert_eq!(bills.list_bills().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_key_never_dedups() {
        let bills = LocalBillStore::new(InMemoryStore::new());
        let a = bills.create(&payload("c1"), "").await.unwrap();
        let b = bills.create(&payload("c1"), "").await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
