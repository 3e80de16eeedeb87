//! Integration tests for the store-backed collaborators.

use bill_kit::backend::{InMemoryStore, StoreBackend};
use bill_kit::entity::StoredEntity;
use bill_kit::local::{LocalBillStore, LocalDirectory};
use bill_kit::model::{
    BillItem, BillPayload, BillType, Customer, Material, PaymentMethod, ProductLine,
};
use bill_kit::serialization::{StoreEnvelope, CURRENT_SCHEMA_VERSION, STORE_MAGIC};
use bill_kit::{BillSubmission, CustomerDirectory};
use std::time::Duration;

fn payload(name: &str, prices: &[f64]) -> BillPayload {
    BillPayload {
        customer_id: None,
        customer_name: name.to_string(),
        customer_phone: "9876543210".to_string(),
        jewelry_type: Material::Silver,
        bill_type: BillType::White,
        products: prices
            .iter()
            .map(|p| ProductLine::from(&BillItem::new("Anklet", *p)))
            .collect(),
        cgst_rate: 1.5,
        sgst_rate: 1.5,
        payment_method: PaymentMethod::Cash,
    }
}

#[tokio::test]
async fn test_directory_and_bills_share_one_store() {
    let store = InMemoryStore::new();
    let directory = LocalDirectory::new(store.clone());
    let bills = LocalBillStore::new(store.clone());

    directory.upsert("Asha Verma", "9876543210").await.unwrap();
    bills.create(&payload("Asha Verma", &[100.0]), "k1").await.unwrap();

    // customer + bill + idempotency index
    assert_eq!(store.len().await, 3);
    assert_eq!(store.keys_with_prefix("customer:").await.unwrap().len(), 1);
    assert_eq!(store.keys_with_prefix("bill:").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_upserts_for_distinct_phones() {
    let directory = LocalDirectory::new(InMemoryStore::new());

    let (a, b, c) = tokio::join!(
        directory.upsert("Asha", "9000000001"),
        directory.upsert("Ravi", "9000000002"),
        directory.upsert("Meena", "9000000003"),
    );
    let ids = [a.unwrap().id, b.unwrap().id, c.unwrap().id];
    assert!(ids[0] != ids[1] && ids[1] != ids[2]);

    let customers = directory.list_customers().await.unwrap();
    assert_eq!(customers.len(), 3);
}

#[tokio::test]
async fn test_list_bills_newest_first() {
    let bills = LocalBillStore::new(InMemoryStore::new());

    let first = bills.create(&payload("Asha", &[100.0]), "").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = bills.create(&payload("Ravi", &[200.0]), "").await.unwrap();

    let listed = bills.list_bills().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[tokio::test]
async fn test_old_schema_customer_reads_as_absent() {
    let store = InMemoryStore::new();
    let customer = Customer {
        id: "c-old".to_string(),
        name: "Old Record".to_string(),
        phone: "9876543210".to_string(),
        created_at: chrono::Utc::now(),
    };
    let envelope = StoreEnvelope {
        magic: STORE_MAGIC,
        version: CURRENT_SCHEMA_VERSION + 1,
        payload: customer.clone(),
    };
    store
        .set("customer:9876543210", postcard::to_allocvec(&envelope).unwrap())
        .await
        .unwrap();

    let directory = LocalDirectory::new(store.clone());
    assert!(!directory.find_by_phone("9876543210").await.unwrap().exists);
    assert!(directory.list_customers().await.unwrap().is_empty());

    // A fresh upsert replaces the unreadable record
    let fresh = directory.upsert("New Record", "9876543210").await.unwrap();
    assert_ne!(fresh.id, customer.id);
    let bytes = store.get("customer:9876543210").await.unwrap().unwrap();
    assert_eq!(Customer::decode(&bytes).unwrap().name, "New Record");
}

#[tokio::test]
async fn test_store_health_flows_through_directory() {
    let directory = LocalDirectory::new(InMemoryStore::new());
    assert!(directory.health_check().await.unwrap());
}
