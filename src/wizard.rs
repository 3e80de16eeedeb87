//! Multi-step bill creation wizard.
//!
//! ```text
//! Phone ──next──▶ Details ──next──▶ Items(Silver|Gold) ──next──▶ Review ──submit──▶ Submitted
//!   ◀──back────────  ◀──back──────────────  ◀──back───────────────
//! ```
//!
//! The wizard exclusively owns its [`BillDraft`]. Every mutation goes through
//! a method on [`WizardStateMachine`], which checks that the operation belongs
//! to the current step and runs the transition guards. Guard failures return
//! [`Error::ValidationError`] and leave the wizard where it was; no I/O is
//! attempted.
//!
//! The only suspension points are the directory lookup and the submit
//! action, both bounded by [`WizardConfig`] timeouts.

use crate::billing::BillTotals;
use crate::config::WizardConfig;
use crate::directory::CustomerDirectory;
use crate::draft::{is_valid_phone, BillDraft};
use crate::error::{Error, Field, Result};
use crate::model::{Bill, BillItem, BillType, Customer, CustomerLookup, ItemPatch, Material, PaymentMethod};
use crate::observability::{mask_phone, NoOpMetrics, WizardMetrics};
use crate::receipt::Receipt;
use crate::strategy::{LookupFailurePolicy, LookupTrigger};
use crate::submission::BillSubmission;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Phone,
    Details,
    /// Item entry; the material picks the default tax preset.
    Items(Material),
    Review,
    Submitted,
}

impl Step {
    /// Zero-based position for progress indicators.
    pub fn index(&self) -> usize {
        match self {
            Step::Phone => 0,
            Step::Details => 1,
            Step::Items(_) => 2,
            Step::Review => 3,
            Step::Submitted => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Phone => "Phone",
            Step::Details => "Details",
            Step::Items(Material::Silver) => "Silver Items",
            Step::Items(Material::Gold) => "Gold Items",
            Step::Review => "Review",
            Step::Submitted => "Submitted",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Phone => write!(f, "phone"),
            Step::Details => write!(f, "details"),
            Step::Items(material) => write!(f, "items ({})", material),
            Step::Review => write!(f, "review"),
            Step::Submitted => write!(f, "submitted"),
        }
    }
}

/// Handle for one directory lookup.
///
/// Obtained from [`WizardStateMachine::begin_lookup`]; only the most recent
/// ticket for the current phone can still be applied.
#[derive(Debug, Clone)]
pub struct LookupTicket {
    sequence: u64,
    phone: String,
    started: Instant,
}

impl LookupTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// How a lookup outcome was applied to the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResolution {
    /// Name pre-filled and locked from this record.
    Existing(Customer),
    /// Confirmed new customer.
    New,
    /// Lookup failed; continuing as a new customer with a warning.
    FailedOpen,
    /// A newer lookup was started, the phone changed, or the wizard moved on.
    Stale,
}

/// Read-only view of the wizard for display surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSnapshot {
    pub step: Step,
    pub draft: BillDraft,
    pub totals: BillTotals,
    pub last_error: Option<String>,
    pub warning: Option<String>,
    pub submitting: bool,
}

/// Shared "submit in flight" flag.
///
/// Clones observe the same flag, so a display surface can read it while the
/// wizard itself is borrowed by [`WizardStateMachine::submit`].
#[derive(Clone, Debug, Default)]
pub struct SubmitIndicator {
    active: Arc<AtomicBool>,
}

impl SubmitIndicator {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn begin(&self) -> PendingSubmit {
        self.active.store(true, Ordering::Release);
        PendingSubmit {
            active: Arc::clone(&self.active),
        }
    }
}

/// Clears the flag when the submit finishes or its future is dropped.
struct PendingSubmit {
    active: Arc<AtomicBool>,
}

impl Drop for PendingSubmit {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

const LOOKUP_FAILED_WARNING: &str =
    "Could not check existing customers; continuing as a new customer.";
const SUBMIT_FAILED_MESSAGE: &str = "Failed to save. Please try again.";
const SUBMIT_TIMEOUT_MESSAGE: &str = "Saving the bill took too long. Please try again.";

/// Bill creation wizard over an injected directory and bill submission.
///
/// # Example
///
/// ```
/// use bill_kit::backend::InMemoryStore;
/// use bill_kit::local::{LocalBillStore, LocalDirectory};
/// use bill_kit::model::{BillItem, BillType};
/// use bill_kit::{Step, WizardStateMachine};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> bill_kit::Result<()> {
/// let store = InMemoryStore::new();
/// let mut wizard = WizardStateMachine::new(
///     LocalDirectory::new(store.clone()),
///     LocalBillStore::new(store),
/// );
///
/// wizard.set_phone("9876543210").await?;
/// wizard.next().await?;
/// wizard.set_customer_name("Asha Verma")?;
/// wizard.set_bill_type(BillType::Green)?;
/// wizard.next().await?;
/// wizard.add_item(BillItem::new("Silver Anklet", 1200.0))?;
/// wizard.next().await?;
/// let bill = wizard.submit().await?;
///
/// assert_eq!(wizard.step(), Step::Submitted);
/// assert_eq!(bill.totals.total, 1200.0);
/// # Ok(())
/// # }
/// ```
pub struct WizardStateMachine<D: CustomerDirectory, S: BillSubmission> {
    directory: D,
    submission: S,
    config: WizardConfig,
    metrics: Box<dyn WizardMetrics>,
    step: Step,
    draft: BillDraft,
    lookup_sequence: u64,
    idempotency_key: Option<String>,
    submitting: SubmitIndicator,
    last_error: Option<String>,
    warning: Option<String>,
    bill: Option<Bill>,
    receipt: Option<Receipt>,
}

impl<D: CustomerDirectory, S: BillSubmission> WizardStateMachine<D, S> {
    /// Create a wizard in the Phone step with an empty draft.
    pub fn new(directory: D, submission: S) -> Self {
        WizardStateMachine {
            directory,
            submission,
            config: WizardConfig::default(),
            metrics: Box::new(NoOpMetrics),
            step: Step::Phone,
            draft: BillDraft::new(),
            lookup_sequence: 0,
            idempotency_key: None,
            submitting: SubmitIndicator::default(),
            last_error: None,
            warning: None,
            bill: None,
            receipt: None,
        }
    }

    pub fn with_config(mut self, config: WizardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn WizardMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &BillDraft {
        &self.draft
    }

    pub fn totals(&self) -> BillTotals {
        self.draft.totals()
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn submission(&self) -> &S {
        &self.submission
    }

    /// Blocking error from the last submit attempt, for a dismissible banner.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Soft warning, e.g. after a fail-open lookup.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// True while a submit action is in flight. Callers disable the control.
    pub fn is_submitting(&self) -> bool {
        self.submitting.is_active()
    }

    /// Handle on the submitting flag that stays readable during `submit`.
    pub fn submit_indicator(&self) -> SubmitIndicator {
        self.submitting.clone()
    }

    /// Bill created by the last successful submit.
    pub fn bill(&self) -> Option<&Bill> {
        self.bill.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Key sent with every submit attempt for the draft under review.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.step,
            draft: self.draft.clone(),
            totals: self.draft.totals(),
            last_error: self.last_error.clone(),
            warning: self.warning.clone(),
            submitting: self.submitting.is_active(),
        }
    }

    // ------------------------------------------------------------------
    // Phone step
    // ------------------------------------------------------------------

    /// Update the phone input.
    ///
    /// With [`LookupTrigger::OnPhoneComplete`] the customer is looked up as
    /// soon as the input is a valid 10-digit number that has not been
    /// resolved yet.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidStep` outside the Phone step
    /// - `Error::LookupError` / `Error::Timeout` when an eager lookup fails
    ///   under [`LookupFailurePolicy::Block`]
    pub async fn set_phone(&mut self, phone: &str) -> Result<()> {
        self.require(Step::Phone, "edit the phone number")?;
        self.draft.phone = phone.trim().to_string();

        if self.config.lookup_trigger == LookupTrigger::OnPhoneComplete
            && is_valid_phone(&self.draft.phone)
            && !self.draft.is_resolved_for(&self.draft.phone)
        {
            self.resolve_customer().await?;
        }
        Ok(())
    }

    /// Start a lookup for the current phone.
    ///
    /// Any ticket issued earlier becomes stale.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidStep` outside Phone and Details
    /// - `Error::ValidationError` if the phone is not 10 digits
    pub fn begin_lookup(&mut self) -> Result<LookupTicket> {
        if !matches!(self.step, Step::Phone | Step::Details) {
            return Err(Error::InvalidStep {
                operation: "look up a customer",
                step: self.step,
            });
        }
        self.guard(self.draft.check_phone())?;

        self.lookup_sequence += 1;
        Ok(LookupTicket {
            sequence: self.lookup_sequence,
            phone: self.draft.phone.clone(),
            started: Instant::now(),
        })
    }

    /// Apply the outcome of a lookup started with [`begin_lookup`](Self::begin_lookup).
    ///
    /// Outcomes for stale tickets are discarded.
    ///
    /// # Errors
    ///
    /// Under [`LookupFailurePolicy::Block`] a failed outcome is returned as
    /// `Error::Timeout` (if it timed out) or `Error::LookupError`.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        outcome: Result<CustomerLookup>,
    ) -> Result<LookupResolution> {
        if ticket.sequence != self.lookup_sequence
            || ticket.phone != self.draft.phone
            || !matches!(self.step, Step::Phone | Step::Details)
        {
            self.metrics.record_stale_lookup(ticket.sequence);
            return Ok(LookupResolution::Stale);
        }

        let masked = mask_phone(&ticket.phone);
        match outcome {
            Ok(lookup) => {
                let customer = if lookup.exists { lookup.customer } else { None };
                self.metrics
                    .record_lookup(&masked, customer.is_some(), ticket.started.elapsed());
                self.warning = None;
                self.draft.seed_customer(&ticket.phone, customer.clone());
                Ok(match customer {
                    Some(customer) => LookupResolution::Existing(customer),
                    None => LookupResolution::New,
                })
            }
            Err(e) => {
                warn!("Customer lookup for {} failed: {}", masked, e);
                self.metrics.record_lookup_failure(&masked, &e.to_string());
                match self.config.lookup_failure {
                    LookupFailurePolicy::FailOpen => {
                        if self.draft.existing_customer.take().is_some() {
                            self.draft.customer_name.clear();
                        }
                        self.draft.resolved_phone = None;
                        self.warning = Some(LOOKUP_FAILED_WARNING.to_string());
                        Ok(LookupResolution::FailedOpen)
                    }
                    LookupFailurePolicy::Block => match e {
                        Error::Timeout(msg) => Err(Error::Timeout(msg)),
                        other => Err(Error::LookupError(other.to_string())),
                    },
                }
            }
        }
    }

    /// Look up the current phone in the directory and seed Details.
    ///
    /// # Errors
    ///
    /// See [`begin_lookup`](Self::begin_lookup) and
    /// [`complete_lookup`](Self::complete_lookup).
    pub async fn resolve_customer(&mut self) -> Result<LookupResolution> {
        let ticket = self.begin_lookup()?;
        let timeout = self.config.lookup_timeout;

        let outcome =
            match tokio::time::timeout(timeout, self.directory.find_by_phone(&ticket.phone)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "customer lookup exceeded {:?}",
                    timeout
                ))),
            };

        self.complete_lookup(ticket, outcome)
    }

    // ------------------------------------------------------------------
    // Details step
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// Rejected when the name was pre-filled from an existing customer.
    pub fn set_customer_name(&mut self, name: &str) -> Result<()> {
        self.require(Step::Details, "edit the customer name")?;
        if self.draft.is_name_locked() {
            return self.guard(Err(Error::validation(
                Field::CustomerName,
                "name is taken from the existing customer record",
            )));
        }
        self.draft.customer_name = name.to_string();
        Ok(())
    }

    pub fn set_bill_type(&mut self, bill_type: BillType) -> Result<()> {
        self.require(Step::Details, "choose the bill type")?;
        self.draft.bill_type = Some(bill_type);
        Ok(())
    }

    /// Choose which item-entry variant (and tax preset) follows Details.
    pub fn set_material(&mut self, material: Material) -> Result<()> {
        self.require(Step::Details, "choose the jewelry type")?;
        self.draft.material = material;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Item entry step
    // ------------------------------------------------------------------

    /// Append an item and return its index.
    pub fn add_item(&mut self, item: BillItem) -> Result<usize> {
        self.require_items("add an item")?;
        let result = self.draft.push_item(item);
        self.guard(result)
    }

    /// Append an empty row to be filled with [`update_item`](Self::update_item).
    pub fn add_blank_item(&mut self) -> Result<usize> {
        self.add_item(BillItem::blank())
    }

    pub fn update_item(&mut self, index: usize, patch: ItemPatch) -> Result<()> {
        self.require_items("edit an item")?;
        let result = self.draft.patch_item(index, patch);
        self.guard(result)
    }

    pub fn remove_item(&mut self, index: usize) -> Result<BillItem> {
        self.require_items("remove an item")?;
        let result = self.draft.take_item(index);
        self.guard(result)
    }

    pub fn set_cgst_percent(&mut self, percent: f64) -> Result<()> {
        self.require_items("change CGST")?;
        let result = self.draft.set_cgst(percent);
        self.guard(result)
    }

    pub fn set_sgst_percent(&mut self, percent: f64) -> Result<()> {
        self.require_items("change SGST")?;
        let result = self.draft.set_sgst(percent);
        self.guard(result)
    }

    // ------------------------------------------------------------------
    // Any step before submission
    // ------------------------------------------------------------------

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<()> {
        if self.step == Step::Submitted {
            return Err(Error::InvalidStep {
                operation: "change the payment method",
                step: self.step,
            });
        }
        self.draft.payment_method = method;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Move forward one step if the current step's guard passes.
    ///
    /// - Phone: 10-digit phone, then a directory lookup unless the phone
    ///   was already resolved.
    /// - Details: name longer than one character and a bill type; item entry
    ///   opens empty with the material's default rates.
    /// - Items: at least one item, every item named, subtotal above zero.
    ///
    /// Review moves on only through [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// - `Error::ValidationError` when the guard fails
    /// - `Error::InvalidStep` in Review and Submitted
    /// - lookup errors under [`LookupFailurePolicy::Block`]
    pub async fn next(&mut self) -> Result<Step> {
        match self.step {
            Step::Phone => {
                self.guard(self.draft.check_phone())?;
                if !self.draft.is_resolved_for(&self.draft.phone) {
                    self.resolve_customer().await?;
                }
                self.transition(Step::Details);
            }
            Step::Details => {
                self.guard(self.draft.check_details())?;
                self.draft.reset_items();
                self.transition(Step::Items(self.draft.material));
            }
            Step::Items(_) => {
                self.guard(self.draft.check_items())?;
                self.idempotency_key = Some(Uuid::new_v4().to_string());
                self.last_error = None;
                self.transition(Step::Review);
            }
            Step::Review | Step::Submitted => {
                return Err(Error::InvalidStep {
                    operation: "continue",
                    step: self.step,
                });
            }
        }
        Ok(self.step)
    }

    /// Go back one step. Data entered in the step being left is kept.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStep` in Phone and Submitted.
    pub fn back(&mut self) -> Result<Step> {
        let previous = match self.step {
            Step::Details => Step::Phone,
            Step::Items(_) => Step::Details,
            Step::Review => Step::Items(self.draft.material),
            Step::Phone | Step::Submitted => {
                return Err(Error::InvalidStep {
                    operation: "go back",
                    step: self.step,
                });
            }
        };
        self.transition(previous);
        Ok(previous)
    }

    /// Return to Phone with an empty draft. Always available.
    pub fn reset(&mut self) {
        self.draft = BillDraft::new();
        self.lookup_sequence += 1;
        self.idempotency_key = None;
        self.last_error = None;
        self.warning = None;
        self.bill = None;
        self.receipt = None;
        self.transition(Step::Phone);
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Save the customer and create the bill.
    ///
    /// On success the wizard moves to Submitted, keeps the bill and its
    /// receipt, and discards the draft. On failure it stays in Review with
    /// [`last_error`](Self::last_error) set; calling `submit` again retries
    /// with the same idempotency key.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidStep` outside Review
    /// - `Error::SubmissionError` if the directory or the bill store fails
    /// - `Error::Timeout` if the whole action exceeds the submit timeout
    pub async fn submit(&mut self) -> Result<Bill> {
        self.require(Step::Review, "submit")?;

        let key = self
            .idempotency_key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let timeout = self.config.submit_timeout;
        let started = Instant::now();

        self.last_error = None;
        let pending = self.submitting.begin();
        let outcome = tokio::time::timeout(
            timeout,
            finalize(&self.directory, &self.submission, &self.draft, &key),
        )
        .await;
        drop(pending);

        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!("bill submission exceeded {:?}", timeout))),
        };

        match result {
            Ok(bill) => {
                self.metrics
                    .record_submission(&bill.bill_number, started.elapsed());
                self.receipt = Some(Receipt::from_bill(&bill));
                self.bill = Some(bill.clone());
                self.draft = BillDraft::new();
                self.idempotency_key = None;
                self.warning = None;
                self.transition(Step::Submitted);
                Ok(bill)
            }
            Err(e) => {
                error!("Bill submission with key {} failed: {}", key, e);
                self.metrics.record_submission_failure(&e.to_string());
                let (message, error) = match e {
                    Error::Timeout(_) => (
                        SUBMIT_TIMEOUT_MESSAGE,
                        Error::Timeout(SUBMIT_TIMEOUT_MESSAGE.to_string()),
                    ),
                    _ => (
                        SUBMIT_FAILED_MESSAGE,
                        Error::SubmissionError(SUBMIT_FAILED_MESSAGE.to_string()),
                    ),
                };
                self.last_error = Some(message.to_string());
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require(&self, step: Step, operation: &'static str) -> Result<()> {
        if self.step == step {
            Ok(())
        } else {
            Err(Error::InvalidStep {
                operation,
                step: self.step,
            })
        }
    }

    fn require_items(&self, operation: &'static str) -> Result<()> {
        match self.step {
            Step::Items(_) => Ok(()),
            step => Err(Error::InvalidStep { operation, step }),
        }
    }

    /// Pass a guard result through, reporting validation failures.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(Error::ValidationError { field, message }) = &result {
            debug!("Validation failed in {}: {} ({})", self.step, message, field);
            self.metrics.record_validation_failure(self.step, *field);
        }
        result
    }

    fn transition(&mut self, to: Step) {
        let from = self.step;
        self.step = to;
        self.metrics.record_transition(from, to);
    }
}

/// Upsert the customer, then create the bill against its id.
async fn finalize<D, S>(directory: &D, submission: &S, draft: &BillDraft, key: &str) -> Result<Bill>
where
    D: CustomerDirectory,
    S: BillSubmission,
{
    let customer = directory
        .upsert(draft.customer_name(), draft.phone())
        .await
        .map_err(|e| match e {
            Error::Timeout(msg) => Error::Timeout(msg),
            other => Error::SubmissionError(format!("saving customer: {}", other)),
        })?;

    let payload = draft.to_payload(Some(customer.id))?;
    submission
        .create(&payload, key)
        .await
        .map_err(|e| match e {
            Error::Timeout(msg) => Error::Timeout(msg),
            other => Error::SubmissionError(format!("creating bill: {}", other)),
        })
}
