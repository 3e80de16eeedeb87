//! # bill-kit
//!
//! Bill computation and a multi-step bill creation wizard for jewelry retail.
//!
//! ## Features
//!
//! - **Pure computation:** subtotal, GST and CGST/SGST split for white and
//!   green bills ([`billing`])
//! - **Guarded wizard:** Phone → Details → Items → Review → Submitted, with
//!   every transition guard enforced in one place ([`WizardStateMachine`])
//! - **Pluggable collaborators:** [`CustomerDirectory`] and [`BillSubmission`]
//!   traits, with in-memory and HTTP implementations
//! - **Bounded I/O:** lookup and submit run under configurable timeouts;
//!   stale lookup responses are discarded
//! - **Observability:** logging through `log` plus a [`WizardMetrics`] hook
//!
//! ## Quick Start
//!
//! ```
//! use bill_kit::backend::InMemoryStore;
//! use bill_kit::local::{LocalBillStore, LocalDirectory};
//! use bill_kit::model::{BillItem, BillType, Material};
//! use bill_kit::{Step, WizardStateMachine};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bill_kit::Result<()> {
//! let store = InMemoryStore::new();
//! let mut wizard = WizardStateMachine::new(
//!     LocalDirectory::new(store.clone()),
//!     LocalBillStore::new(store),
//! );
//!
//! // 1. Phone: resolved against the directory on "next"
//! wizard.set_phone("9876543210").await?;
//! wizard.next().await?;
//!
//! // 2. Details
//! wizard.set_customer_name("Asha Verma")?;
//! wizard.set_bill_type(BillType::White)?;
//! wizard.set_material(Material::Gold)?;
//! wizard.next().await?;
//!
//! // 3. Items (gold preset: 3% + 3%)
//! wizard.set_cgst_percent(1.5)?;
//! wizard.set_sgst_percent(1.5)?;
//! wizard.add_item(BillItem::new("Gold Ring", 15000.0))?;
//! assert_eq!(wizard.totals().total, 15450.0);
//! wizard.next().await?;
//!
//! // 4. Review -> Submitted
//! let bill = wizard.submit().await?;
//! assert_eq!(wizard.step(), Step::Submitted);
//! assert!(bill.bill_number.starts_with("BILL-"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing a wizard between tasks
//!
//! Use [`WizardHandle`], a cloneable `Arc<Mutex<_>>` wrapper:
//!
//! ```ignore
//! let handle = WizardHandle::new(directory, bills);
//! let ui = handle.clone();
//! ui.lock().await.set_phone("9876543210").await?;
//! let view = handle.snapshot().await;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod billing;
pub mod config;
pub mod directory;
pub mod draft;
pub mod entity;
pub mod error;
pub mod key;
pub mod local;
pub mod model;
pub mod observability;
pub mod receipt;
#[cfg(feature = "http")]
pub mod remote;
pub mod serialization;
pub mod service;
pub mod strategy;
pub mod submission;
pub mod wizard;

// Re-exports for convenience
pub use billing::{compute_totals, BillTotals};
pub use config::WizardConfig;
pub use directory::CustomerDirectory;
pub use draft::BillDraft;
pub use error::{Error, Field, Result};
pub use observability::WizardMetrics;
pub use receipt::Receipt;
pub use service::WizardHandle;
pub use strategy::{LookupFailurePolicy, LookupTrigger};
pub use submission::BillSubmission;
pub use wizard::{
    LookupResolution, LookupTicket, Step, SubmitIndicator, WizardSnapshot, WizardStateMachine,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
