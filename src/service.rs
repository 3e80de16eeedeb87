//! Shareable wizard handle for multi-task applications.
//!
//! Provides a convenient wrapper around WizardStateMachine with Arc for easy
//! sharing.

use crate::config::WizardConfig;
use crate::directory::CustomerDirectory;
use crate::observability::WizardMetrics;
use crate::submission::BillSubmission;
use crate::wizard::{SubmitIndicator, WizardSnapshot, WizardStateMachine};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Shareable handle to one wizard session.
///
/// The wizard is the single owner of its draft, so every access goes through
/// an async mutex. A UI task and a background task can both hold a clone;
/// operations are serialized, and a submit in flight keeps the lock until it
/// finishes. [`is_submitting`](Self::is_submitting) does not take the lock,
/// so it can drive a pending indicator during that time.
///
/// # Example
///
/// ```
/// use bill_kit::backend::InMemoryStore;
/// use bill_kit::local::{LocalBillStore, LocalDirectory};
/// use bill_kit::{Step, WizardHandle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> bill_kit::Result<()> {
/// let store = InMemoryStore::new();
/// let handle = WizardHandle::new(LocalDirectory::new(store.clone()), LocalBillStore::new(store));
///
/// let ui = handle.clone();
/// ui.lock().await.set_phone("9876543210").await?;
///
/// assert_eq!(handle.snapshot().await.draft.phone(), "9876543210");
/// assert_eq!(handle.snapshot().await.step, Step::Phone);
/// # Ok(())
/// # }
/// ```
pub struct WizardHandle<D: CustomerDirectory, S: BillSubmission> {
    inner: Arc<Mutex<WizardStateMachine<D, S>>>,
    submitting: SubmitIndicator,
}

impl<D: CustomerDirectory, S: BillSubmission> Clone for WizardHandle<D, S> {
    fn clone(&self) -> Self {
        WizardHandle {
            inner: Arc::clone(&self.inner),
            submitting: self.submitting.clone(),
        }
    }
}

impl<D: CustomerDirectory, S: BillSubmission> WizardHandle<D, S> {
    /// Create a handle around a fresh wizard.
    pub fn new(directory: D, submission: S) -> Self {
        Self::from_wizard(WizardStateMachine::new(directory, submission))
    }

    /// Create a handle with custom configuration and metrics.
    pub fn with_options(
        directory: D,
        submission: S,
        config: WizardConfig,
        metrics: Box<dyn WizardMetrics>,
    ) -> Self {
        Self::from_wizard(
            WizardStateMachine::new(directory, submission)
                .with_config(config)
                .with_metrics(metrics),
        )
    }

    pub fn from_wizard(wizard: WizardStateMachine<D, S>) -> Self {
        WizardHandle {
            submitting: wizard.submit_indicator(),
            inner: Arc::new(Mutex::new(wizard)),
        }
    }

    /// Exclusive access to the wizard for the duration of the guard.
    pub async fn lock(&self) -> MutexGuard<'_, WizardStateMachine<D, S>> {
        self.inner.lock().await
    }

    /// True while a submit is in flight. Never waits for the wizard lock.
    pub fn is_submitting(&self) -> bool {
        self.submitting.is_active()
    }

    /// Copy of the current step, draft and banners for rendering.
    pub async fn snapshot(&self) -> WizardSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Start over, waiting for any in-flight operation first.
    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }
}
