//! Observability hooks for wizard activity.
//!
//! Implement [`WizardMetrics`] to forward wizard events to a monitoring
//! system:
//!
//! ```ignore
//! use bill_kit::observability::WizardMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl WizardMetrics for PrometheusMetrics {
//!     fn record_submission(&self, _bill_number: &str, _duration: Duration) {
//!         // counter!("bills_created").inc();
//!     }
//! }
//!
//! // let wizard = WizardStateMachine::new(directory, bills)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Every method has a default that logs through the `log` crate, so an
//! implementation only overrides what it cares about. The wizard uses
//! [`NoOpMetrics`] unless told otherwise; its own `debug!`/`warn!` lines
//! still go to the logger.
//!
//! Phone numbers are masked before they reach a hook.

use crate::error::Field;
use crate::wizard::Step;
use std::time::Duration;

/// Trait for wizard metrics collection.
pub trait WizardMetrics: Send + Sync {
    /// A step transition happened (forward, back or reset).
    fn record_transition(&self, from: Step, to: Step) {
        debug!("Wizard {} -> {}", from, to);
    }

    /// A transition guard or input check rejected the user's action.
    fn record_validation_failure(&self, step: Step, field: Field) {
        debug!("Wizard validation failed in {}: {}", step, field);
    }

    /// Directory lookup finished.
    fn record_lookup(&self, masked_phone: &str, found: bool, duration: Duration) {
        debug!(
            "Customer lookup {} -> {} in {:?}",
            masked_phone,
            if found { "FOUND" } else { "NEW" },
            duration
        );
    }

    /// Directory lookup failed or timed out.
    fn record_lookup_failure(&self, masked_phone: &str, error: &str) {
        warn!("Customer lookup {} failed: {}", masked_phone, error);
    }

    /// A lookup response arrived after a newer one was requested.
    fn record_stale_lookup(&self, sequence: u64) {
        debug!("Discarded stale lookup response #{}", sequence);
    }

    /// Bill created.
    fn record_submission(&self, bill_number: &str, duration: Duration) {
        info!("Bill {} created in {:?}", bill_number, duration);
    }

    /// Submission failed.
    fn record_submission_failure(&self, error: &str) {
        warn!("Bill submission failed: {}", error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl WizardMetrics for NoOpMetrics {
    fn record_transition(&self, _from: Step, _to: Step) {}
    fn record_validation_failure(&self, _step: Step, _field: Field) {}
    fn record_lookup(&self, _masked_phone: &str, _found: bool, _duration: Duration) {}
    fn record_lookup_failure(&self, _masked_phone: &str, _error: &str) {}
    fn record_stale_lookup(&self, _sequence: u64) {}
    fn record_submission(&self, _bill_number: &str, _duration: Duration) {}
    fn record_submission_failure(&self, _error: &str) {}
}

/// Metrics implementation that only uses the logging defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl WizardMetrics for LogMetrics {}

/// Mask all but the last four characters of a phone number.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let mut masked = "*".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}
