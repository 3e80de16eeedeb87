//! Customer lookup strategies.
//!
//! Two independent choices control how the wizard talks to the
//! [`CustomerDirectory`](crate::directory::CustomerDirectory):
//!
//! | Choice | Variants | Default |
//! |--------|----------|---------|
//! | [`LookupTrigger`] | `OnDetailsEntry`, `OnPhoneComplete` | `OnDetailsEntry` |
//! | [`LookupFailurePolicy`] | `FailOpen`, `Block` | `FailOpen` |
//!
//! # Lookup count per session
//!
//! ```text
//! OnDetailsEntry   one lookup per Phone -> Details transition with a new phone
//! OnPhoneComplete  one lookup each time the phone input becomes a valid
//!                  10-digit number; none on Phone -> Details if it already ran
//! ```
//!
//! # Failure handling
//!
//! `FailOpen` treats a failed lookup as "new customer" and keeps a soft
//! warning. A transient network error can therefore lead to a second customer
//! record for the same person once the bill is submitted against a remote API
//! that does not dedup on phone. `Block` keeps the wizard in Phone and
//! reports [`Error::LookupError`](crate::error::Error::LookupError) instead.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// When the wizard queries the directory for the entered phone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LookupTrigger {
    /// Look up on the Phone -> Details transition.
    #[default]
    OnDetailsEntry,

    /// Look up as soon as the phone input holds 10 digits.
    OnPhoneComplete,
}

/// What a transport-level lookup failure means for the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LookupFailurePolicy {
    /// Continue as a new customer and record a warning.
    #[default]
    FailOpen,

    /// Stay in Phone and report the failure.
    Block,
}

impl fmt::Display for LookupTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupTrigger::OnDetailsEntry => write!(f, "details_entry"),
            LookupTrigger::OnPhoneComplete => write!(f, "phone_complete"),
        }
    }
}

impl fmt::Display for LookupFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailurePolicy::FailOpen => write!(f, "fail_open"),
            LookupFailurePolicy::Block => write!(f, "block"),
        }
    }
}

impl FromStr for LookupTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "details_entry" | "details" => Ok(LookupTrigger::OnDetailsEntry),
            "phone_complete" | "phone" => Ok(LookupTrigger::OnPhoneComplete),
            other => Err(Error::ConfigError(format!(
                "unknown lookup trigger '{}'",
                other
            ))),
        }
    }
}

impl FromStr for LookupFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Ok(LookupFailurePolicy::FailOpen),
            "block" => Ok(LookupFailurePolicy::Block),
            other => Err(Error::ConfigError(format!(
                "unknown lookup failure policy '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(LookupTrigger::default(), LookupTrigger::OnDetailsEntry);
        assert_eq!(LookupFailurePolicy::default(), LookupFailurePolicy::FailOpen);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        for trigger in [LookupTrigger::OnDetailsEntry, LookupTrigger::OnPhoneComplete] {
            assert_eq!(trigger.to_string().parse::<LookupTrigger>().unwrap(), trigger);
        }
        for policy in [LookupFailurePolicy::FailOpen, LookupFailurePolicy::Block] {
            assert_eq!(
                policy.to_string().parse::<LookupFailurePolicy>().unwrap(),
                policy
            );
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(
            "sometimes".parse::<LookupTrigger>(),
            Err(Error::ConfigError(_))
        ));
    }
}
