//! HTTP collaborator tests against an in-process fake billing API.
//!
//! Run with: cargo test --features http

#![cfg(feature = "http")]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use bill_kit::model::{BillItem, BillPayload, BillType, Material, PaymentMethod, ProductLine};
use bill_kit::remote::{HttpApi, HttpBillSubmission, HttpConfig, HttpDirectory};
use bill_kit::{BillSubmission, CustomerDirectory, Error, Step, WizardStateMachine};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "test-token";

type ApiResult = std::result::Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Clone, Default)]
struct FakeApi {
    customers: Arc<Mutex<Vec<Value>>>,
    bill_keys: Arc<Mutex<Vec<String>>>,
    bills_created: Arc<AtomicUsize>,
    fail_bills: Arc<AtomicBool>,
    empty_bills: Arc<AtomicBool>,
    slow_search: Arc<AtomicBool>,
}

fn authorized(headers: &HeaderMap) -> std::result::Result<(), (StatusCode, Json<Value>)> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Not authorized, no token" })),
        )),
    }
}

async fn search(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    authorized(&headers)?;
    if api.slow_search.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    let needle = query.get("search").cloned().unwrap_or_default();
    let matches: Vec<Value> = api
        .customers
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["phoneNumber"].as_str().unwrap_or("").contains(&needle))
        .cloned()
        .collect();
    Ok(Json(json!({ "success": true, "message": "ok", "data": matches })))
}

async fn create_customer(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    authorized(&headers)?;
    let mut customers = api.customers.lock().unwrap();
    let customer = json!({
        "_id": format!("cust-{}", customers.len() + 1),
        "name": body["name"],
        "phoneNumber": body["phoneNumber"],
        "createdAt": "2025-03-09T10:00:00Z",
    });
    customers.push(customer.clone());
    Ok(Json(json!({ "success": true, "message": "created", "data": customer })))
}

async fn update_customer(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    authorized(&headers)?;
    let mut customers = api.customers.lock().unwrap();
    match customers.iter_mut().find(|c| c["_id"] == id.as_str()) {
        Some(customer) => {
            customer["name"] = body["name"].clone();
            Ok(Json(json!({ "success": true, "message": "updated", "data": customer.clone() })))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Customer not found" })),
        )),
    }
}

async fn create_bill(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    authorized(&headers)?;
    if let Some(key) = headers.get("idempotency-key").and_then(|v| v.to_str().ok()) {
        api.bill_keys.lock().unwrap().push(key.to_string());
    }
    if api.fail_bills.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Database unavailable" })),
        ));
    }
    if body["products"].as_array().map_or(true, |p| p.is_empty()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "No products" })),
        ));
    }
    if api.empty_bills.load(Ordering::SeqCst) {
        return Ok(Json(json!({ "success": true, "message": "Bill created" })));
    }
    let n = api.bills_created.fetch_add(1, Ordering::SeqCst) + 1;
    Ok(Json(json!({
        "success": true,
        "message": "Bill created",
        "data": { "_id": format!("bill-{}", n), "billNumber": format!("BILL-250309-{:03}", n) },
    })))
}

async fn start_server(api: FakeApi) -> String {
    let app = Router::new()
        .route("/api/customers/search", get(search))
        .route("/api/customers", post(create_customer))
        .route("/api/customers/{id}", patch(update_customer))
        .route("/api/bills/", post(create_bill))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: &str) -> HttpApi {
    let _ = env_logger::builder().is_test(true).try_init();
    HttpApi::new(&HttpConfig::new(base_url).with_token(TOKEN)).unwrap()
}

#[tokio::test]
async fn test_find_by_phone_requires_exact_match() {
    let api = FakeApi::default();
    api.customers.lock().unwrap().push(json!({
        "_id": "cust-1", "name": "Ravi Kumar", "phoneNumber": "9876543210"
    }));
    let directory = HttpDirectory::new(client(&start_server(api).await));

    let lookup = directory.find_by_phone("9876543210").await.unwrap();
    assert!(lookup.exists);
    assert_eq!(lookup.customer.unwrap().name, "Ravi Kumar");

    // "98765" is a substring match server-side but not the same phone
    let lookup = directory.find_by_phone("98765").await.unwrap();
    assert!(!lookup.exists);
}

#[tokio::test]
async fn test_upsert_creates_then_renames() {
    let api = FakeApi::default();
    let directory = HttpDirectory::new(client(&start_server(api.clone()).await));

    let created = directory.upsert(" Asha ", "9876543210").await.unwrap();
    assert_eq!(created.name, "Asha");
    assert_eq!(created.phone, "9876543210");

    let renamed = directory.upsert("Asha Verma", "9876543210").await.unwrap();
    assert_eq!(renamed.id, created.id);
    assert_eq!(renamed.name, "Asha Verma");
    assert_eq!(api.customers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_token_is_backend_error_with_server_message() {
    let base = start_server(FakeApi::default()).await;
    let _ = env_logger::builder().is_test(true).try_init();
    let directory = HttpDirectory::new(HttpApi::new(&HttpConfig::new(base)).unwrap());

    let err = directory.find_by_phone("9876543210").await.unwrap_err();
    match err {
        Error::BackendError(msg) => assert!(msg.contains("Not authorized"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_request_timeout_maps_to_timeout() {
    let api = FakeApi::default();
    api.slow_search.store(true, Ordering::SeqCst);
    let base = start_server(api).await;
    let config = HttpConfig::new(base)
        .with_token(TOKEN)
        .with_request_timeout(Duration::from_millis(200));
    let directory = HttpDirectory::new(HttpApi::new(&config).unwrap());

    let err = directory.find_by_phone("9876543210").await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "{:?}", err);
}

#[tokio::test]
async fn test_wizard_over_http() {
    let api = FakeApi::default();
    let http = client(&start_server(api.clone()).await);
    let mut wizard =
        WizardStateMachine::new(HttpDirectory::new(http.clone()), HttpBillSubmission::new(http));

    wizard.set_phone("9876543210").await.unwrap();
    wizard.next().await.unwrap();
    wizard.set_customer_name("Asha Verma").unwrap();
    wizard.set_bill_type(BillType::White).unwrap();
    wizard.set_material(Material::Gold).unwrap();
    wizard.next().await.unwrap();
    wizard.add_item(BillItem::new("Gold Ring", 15000.0)).unwrap();
    wizard.set_cgst_percent(1.5).unwrap();
    wizard.set_sgst_percent(1.5).unwrap();
    wizard.next().await.unwrap();

    // First attempt fails server-side, retry succeeds with the same key
    api.fail_bills.store(true, Ordering::SeqCst);
    assert!(matches!(wizard.submit().await, Err(Error::SubmissionError(_))));
    assert_eq!(wizard.step(), Step::Review);

    api.fail_bills.store(false, Ordering::SeqCst);
    let bill = wizard.submit().await.unwrap();

    assert_eq!(wizard.step(), Step::Submitted);
    assert_eq!(bill.bill_number, "BILL-250309-001");
    assert_eq!(bill.id, "bill-1");
    assert_eq!(bill.customer_id.as_deref(), Some("cust-1"));
    assert!((bill.totals.total - 15450.0).abs() < 1e-6);

    let keys = api.bill_keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_bill_response_without_data_is_an_error() {
    let api = FakeApi::default();
    api.empty_bills.store(true, Ordering::SeqCst);
    let bills = HttpBillSubmission::new(client(&start_server(api).await));

    let payload = BillPayload {
        customer_id: Some("cust-1".to_string()),
        customer_name: "Asha Verma".to_string(),
        customer_phone: "9876543210".to_string(),
        jewelry_type: Material::Silver,
        bill_type: BillType::Green,
        products: vec![ProductLine::from(&BillItem::new("Anklet", 1200.0))],
        cgst_rate: 0.0,
        sgst_rate: 0.0,
        payment_method: PaymentMethod::Cash,
    };
    let err = bills.create(&payload, "key-1").await.unwrap_err();
    assert!(matches!(err, Error::DeserializationError(_)), "{:?}", err);
}

#[tokio::test]
async fn test_wizard_stays_in_review_when_bill_is_not_numbered() {
    let api = FakeApi::default();
    let http = client(&start_server(api.clone()).await);
    let mut wizard =
        WizardStateMachine::new(HttpDirectory::new(http.clone()), HttpBillSubmission::new(http));

    wizard.set_phone("9876543210").await.unwrap();
    wizard.next().await.unwrap();
    wizard.set_customer_name("Asha Verma").unwrap();
    wizard.set_bill_type(BillType::Green).unwrap();
    wizard.next().await.unwrap();
    wizard.add_item(BillItem::new("Anklet", 1200.0)).unwrap();
    wizard.next().await.unwrap();

    api.empty_bills.store(true, Ordering::SeqCst);
    assert!(matches!(wizard.submit().await, Err(Error::SubmissionError(_))));
    assert_eq!(wizard.step(), Step::Review);
    assert!(wizard.receipt().is_none());
    assert!(wizard.last_error().is_some());
}
