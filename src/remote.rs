//! REST collaborators for the billing API.
//!
//! Enabled with the `http` feature.
//!
//! ```no_run
//! use bill_kit::remote::{HttpApi, HttpBillSubmission, HttpConfig, HttpDirectory};
//! use bill_kit::WizardStateMachine;
//!
//! # fn main() -> bill_kit::Result<()> {
//! let api = HttpApi::new(&HttpConfig::from_env()?)?;
//! let wizard = WizardStateMachine::new(
//!     HttpDirectory::new(api.clone()),
//!     HttpBillSubmission::new(api),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Every response uses the same envelope:
//!
//! ```text
//! { "success": bool, "message": string, "data": ... }
//! ```

use crate::directory::CustomerDirectory;
use crate::error::{Error, Result};
use crate::model::{Bill, BillPayload, Customer, CustomerLookup};
use crate::submission::BillSubmission;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the billing API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    /// API root, e.g. `https://billing.example.com/api`
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpConfig {
            base_url: base_url.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `BILLING_API_URL` (required) and `BILLING_API_TOKEN` (optional).
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `BILLING_API_URL` is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = get("BILLING_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::ConfigError("BILLING_API_URL is not set".to_string()))?;

        let mut config = HttpConfig::new(base_url);
        if let Some(token) = get("BILLING_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.token = Some(token.trim().to_string());
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCustomer {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    phone_number: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<ApiCustomer> for Customer {
    fn from(c: ApiCustomer) -> Self {
        Customer {
            id: c.id,
            name: c.name,
            phone: c.phone_number,
            created_at: c.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBill {
    bill_number: String,
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Shared HTTP client for the billing API.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    /// # Errors
    /// Returns `Error::BackendError` if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        info!("Billing API client for {}", config.base_url);
        Ok(HttpApi {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>> {
        let response = builder.send().await?;
        read_envelope(response).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| status.to_string());
        warn!("Billing API returned {}: {}", status, message);
        return Err(Error::BackendError(format!("{} ({})", message, status.as_u16())));
    }

    let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
    if envelope.success == Some(false) {
        let message = envelope
            .message
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(Error::BackendError(message));
    }
    Ok(envelope.data)
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Clone, Debug)]
pub struct HttpDirectory {
    api: HttpApi,
}

impl HttpDirectory {
    pub fn new(api: HttpApi) -> Self {
        HttpDirectory { api }
    }

    async fn search(&self, phone: &str) -> Result<Option<Customer>> {
        let builder = self
            .api
            .request(Method::GET, "customers/search")
            .query(&[("search", phone)]);
        let matches: Vec<ApiCustomer> = self.api.send(builder).await?.unwrap_or_default();

        // search is a substring match server-side
        Ok(matches
            .into_iter()
            .find(|c| c.phone_number.trim() == phone)
            .map(Customer::from))
    }
}

impl CustomerDirectory for HttpDirectory {
    async fn find_by_phone(&self, phone: &str) -> Result<CustomerLookup> {
        match self.search(phone.trim()).await? {
            Some(customer) => Ok(CustomerLookup::found(customer)),
            None => Ok(CustomerLookup::not_found()),
        }
    }

    async fn upsert(&self, name: &str, phone: &str) -> Result<Customer> {
        let name = name.trim();
        let phone = phone.trim();

        if let Some(mut existing) = self.search(phone).await? {
            if existing.name == name {
                return Ok(existing);
            }
            let builder = self
                .api
                .request(Method::PATCH, &format!("customers/{}", existing.id))
                .json(&json!({ "name": name }));
            let updated: Option<ApiCustomer> = self.api.send(builder).await?;
            return Ok(match updated {
                Some(customer) => customer.into(),
                None => {
                    existing.name = name.to_string();
                    existing
                }
            });
        }

        let builder = self
            .api
            .request(Method::POST, "customers")
            .json(&json!({ "name": name, "phoneNumber": phone }));
        let created: Option<ApiCustomer> = self.api.send(builder).await?;
        created
            .map(Customer::from)
            .ok_or_else(|| Error::DeserializationError("customer missing from response".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        let builder = self
            .api
            .request(Method::GET, "customers/search")
            .query(&[("search", "")]);
        let _: Option<serde_json::Value> = self.api.send(builder).await?;
        Ok(true)
    }
}

// ============================================================================
// Bills
// ============================================================================

#[derive(Clone, Debug)]
pub struct HttpBillSubmission {
    api: HttpApi,
}

impl HttpBillSubmission {
    pub fn new(api: HttpApi) -> Self {
        HttpBillSubmission { api }
    }
}

impl BillSubmission for HttpBillSubmission {
    async fn create(&self, payload: &BillPayload, idempotency_key: &str) -> Result<Bill> {
        let mut builder = self.api.request(Method::POST, "bills/").json(payload);
        if !idempotency_key.is_empty() {
            builder = builder.header("Idempotency-Key", idempotency_key);
        }

        // the bill exists only once the server has numbered it
        let created: ApiBill = self.api.send(builder).await?.ok_or_else(|| {
            warn!("Bill response carried no data");
            Error::DeserializationError("bill missing from response".to_string())
        })?;

        Ok(Bill::from_payload(
            created.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created.bill_number,
            payload,
            created.created_at.unwrap_or_else(Utc::now),
        ))
    }
}
