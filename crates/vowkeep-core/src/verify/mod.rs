//! External evidence verification.
//!
//! The audit asks one question: did committed evidence appear for date D?
//! Providers answer with a tri-state contract -- `Ok(true)`, `Ok(false)`, or
//! an error. [`VerificationError::Transient`] means "couldn't check", which
//! the audit must surface for retry instead of recording a breach;
//! conflating the two would penalize users on flaky networks.

pub mod github;
pub mod local;

pub use github::GithubVerifier;
pub use local::LocalEvidenceVerifier;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::VerificationError;

/// Answers "does external evidence exist for this date?".
pub trait VerificationProvider {
    fn was_verified(&self, date: NaiveDate) -> Result<bool, VerificationError>;
}

/// Primary verifier with a fallback consulted ONLY when the primary is
/// inconclusive. A definite `Ok(false)` from the primary is final -- the
/// fallback must not be able to paper over genuinely missing evidence.
pub struct ChainVerifier<'a> {
    primary: &'a dyn VerificationProvider,
    fallback: &'a dyn VerificationProvider,
}

impl<'a> ChainVerifier<'a> {
    pub fn new(
        primary: &'a dyn VerificationProvider,
        fallback: &'a dyn VerificationProvider,
    ) -> Self {
        Self { primary, fallback }
    }
}

impl VerificationProvider for ChainVerifier<'_> {
    fn was_verified(&self, date: NaiveDate) -> Result<bool, VerificationError> {
        match self.primary.was_verified(date) {
            Err(VerificationError::Transient(_)) => self.fallback.was_verified(date),
            other => other,
        }
    }
}

/// Canned verifier for tests and offline dry runs.
#[derive(Debug, Default)]
pub struct FixedVerifier {
    default: bool,
    dates: BTreeMap<NaiveDate, bool>,
}

impl FixedVerifier {
    /// Every date answers `verified`.
    pub fn always(verified: bool) -> Self {
        Self {
            default: verified,
            dates: BTreeMap::new(),
        }
    }

    /// Override the answer for one date.
    pub fn with_date(mut self, date: NaiveDate, verified: bool) -> Self {
        self.dates.insert(date, verified);
        self
    }
}

impl VerificationProvider for FixedVerifier {
    fn was_verified(&self, date: NaiveDate) -> Result<bool, VerificationError> {
        Ok(*self.dates.get(&date).unwrap_or(&self.default))
    }
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "vowkeep";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
