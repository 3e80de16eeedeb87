//! Wizard configuration.

use crate::error::{Error, Result};
use crate::strategy::{LookupFailurePolicy, LookupTrigger};
use std::time::Duration;

/// Default timeout for a directory lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for customer upsert plus bill creation.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Setup-time configuration for a [`WizardStateMachine`](crate::WizardStateMachine).
///
/// # Example
///
/// ```
/// use bill_kit::{WizardConfig, strategy::LookupFailurePolicy};
/// use std::time::Duration;
///
/// let config = WizardConfig::default()
///     .with_lookup_timeout(Duration::from_secs(2))
///     .with_lookup_failure(LookupFailurePolicy::Block);
/// assert_eq!(config.lookup_timeout, Duration::from_secs(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardConfig {
    /// Upper bound for one `find_by_phone` call.
    pub lookup_timeout: Duration,

    /// Upper bound for one submit action (upsert + create).
    pub submit_timeout: Duration,

    pub lookup_trigger: LookupTrigger,

    pub lookup_failure: LookupFailurePolicy,
}

impl Default for WizardConfig {
    fn default() -> Self {
        WizardConfig {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            lookup_trigger: LookupTrigger::default(),
            lookup_failure: LookupFailurePolicy::default(),
        }
    }
}

impl WizardConfig {
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_lookup_trigger(mut self, trigger: LookupTrigger) -> Self {
        self.lookup_trigger = trigger;
        self
    }

    pub fn with_lookup_failure(mut self, policy: LookupFailurePolicy) -> Self {
        self.lookup_failure = policy;
        self
    }

    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// - `BILLING_LOOKUP_TIMEOUT_MS`
    /// - `BILLING_SUBMIT_TIMEOUT_MS`
    /// - `BILLING_LOOKUP_TRIGGER` (`details_entry` | `phone_complete`)
    /// - `BILLING_LOOKUP_FAILURE` (`fail_open` | `block`)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = WizardConfig::default();

        if let Some(ms) = get("BILLING_LOOKUP_TIMEOUT_MS") {
            config.lookup_timeout = parse_millis("BILLING_LOOKUP_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = get("BILLING_SUBMIT_TIMEOUT_MS") {
            config.submit_timeout = parse_millis("BILLING_SUBMIT_TIMEOUT_MS", &ms)?;
        }
        if let Some(trigger) = get("BILLING_LOOKUP_TRIGGER") {
            config.lookup_trigger = trigger.parse()?;
        }
        if let Some(policy) = get("BILLING_LOOKUP_FAILURE") {
            config.lookup_failure = policy.parse()?;
        }

        debug!(
            "Wizard config: lookup_timeout={:?} submit_timeout={:?} trigger={} failure={}",
            config.lookup_timeout,
            config.submit_timeout,
            config.lookup_trigger,
            config.lookup_failure
        );

        Ok(config)
    }
}

fn parse_millis(name: &str, value: &str) -> Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .map_err(|_| Error::ConfigError(format!("Invalid {}: '{}'", name, value)))?;
    if ms == 0 {
        return Err(Error::ConfigError(format!("{} must be greater than 0", name)));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = WizardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WizardConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = WizardConfig::from_lookup(lookup(&[
            ("BILLING_LOOKUP_TIMEOUT_MS", "750"),
            ("BILLING_SUBMIT_TIMEOUT_MS", "20000"),
            ("BILLING_LOOKUP_TRIGGER", "phone_complete"),
            ("BILLING_LOOKUP_FAILURE", "block"),
        ]))
        .unwrap();

        assert_eq!(config.lookup_timeout, Duration::from_millis(750));
        assert_eq!(config.submit_timeout, Duration::from_secs(20));
        assert_eq!(config.lookup_trigger, LookupTrigger::OnPhoneComplete);
        assert_eq!(config.lookup_failure, LookupFailurePolicy::Block);
    }

    #[test]
    fn test_invalid_timeout() {
        let err = WizardConfig::from_lookup(lookup(&[("BILLING_LOOKUP_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err =
            WizardConfig::from_lookup(lookup(&[("BILLING_SUBMIT_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
