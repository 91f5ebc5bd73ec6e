//! The daily audit.
//!
//! Once per calendar day, yesterday's claim is reconciled against external
//! evidence: no claim or no evidence records a breach, a verified claim
//! extends the streak. Exactly one of the two happens per effective run.
//!
//! Reentrancy: every effective run writes a per-date outcome marker in the
//! same transaction as its mutation, and later runs for the same date
//! short-circuit on the marker. A retrying trigger therefore cannot
//! double-penalize. An inconclusive verification aborts the run with no
//! writes at all; the trigger is expected to retry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::breach::{BreachKind, BreachLedger};
use crate::clock::Clock;
use crate::error::{DatabaseError, Result};
use crate::notify::Notifier;
use crate::storage::{LedgerDb, RepairConfig};
use crate::streak::{BreachImpact, StreakEngine, StreakIncrement};
use crate::verify::VerificationProvider;

/// What one audit run recorded (or found already recorded).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// No claim was submitted for the audited date.
    MissedClaim { breach_id: i64, impact: BreachImpact },
    /// A claim exists but external evidence does not back it.
    AuditMismatch { breach_id: i64, impact: BreachImpact },
    /// Claim and evidence agree; the streak grew.
    Verified { streak: StreakIncrement },
    /// A previous run already recorded this date; nothing was changed.
    AlreadyRecorded { outcome: String },
}

impl AuditOutcome {
    /// Marker string persisted in the audit log.
    fn marker(&self) -> &'static str {
        match self {
            AuditOutcome::MissedClaim { .. } => "missed_claim",
            AuditOutcome::AuditMismatch { .. } => "audit_mismatch",
            AuditOutcome::Verified { .. } => "verified",
            AuditOutcome::AlreadyRecorded { .. } => "already_recorded",
        }
    }
}

/// Reconciles one day's claim against external evidence.
pub struct DailyAudit<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
    verifier: &'a dyn VerificationProvider,
    notifier: Option<&'a dyn Notifier>,
    repair: RepairConfig,
}

impl<'a> DailyAudit<'a> {
    pub fn new(
        db: &'a LedgerDb,
        clock: &'a dyn Clock,
        verifier: &'a dyn VerificationProvider,
    ) -> Self {
        Self {
            db,
            clock,
            verifier,
            notifier: None,
            repair: RepairConfig::default(),
        }
    }

    /// Report recorded outcomes through `notifier`.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Audit yesterday (relative to the injected clock).
    pub fn run(&self) -> Result<AuditOutcome> {
        self.run_for(self.clock.today() - chrono::Duration::days(1))
    }

    /// Audit a specific date. Used by catch-up triggers that replay days
    /// missed while the device was off.
    pub fn run_for(&self, date: NaiveDate) -> Result<AuditOutcome> {
        if let Some(outcome) = self.db.audit_outcome_for(date)? {
            return Ok(AuditOutcome::AlreadyRecorded { outcome });
        }

        let outcome = if self.db.claim_for_date(date)?.is_none() {
            self.record_breach(
                date,
                BreachKind::MissedClaim,
                &format!("no claim submitted for {date}"),
            )?
        } else {
            // The one potentially slow call. An Err here is "inconclusive":
            // propagate with no writes so the trigger retries later.
            if self.verifier.was_verified(date)? {
                self.record_success(date)?
            } else {
                self.record_breach(
                    date,
                    BreachKind::AuditMismatch,
                    &format!("claim present but no external evidence for {date}"),
                )?
            }
        };

        if let Some(notifier) = self.notifier {
            notifier.notify(date, &outcome);
        }
        Ok(outcome)
    }

    fn record_breach(
        &self,
        date: NaiveDate,
        kind: BreachKind,
        reason: &str,
    ) -> Result<AuditOutcome> {
        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;

        let recorded =
            BreachLedger::new(self.db, self.clock, &self.repair).record_in_tx(kind, reason, date)?;
        let outcome = match kind {
            BreachKind::MissedClaim => AuditOutcome::MissedClaim {
                breach_id: recorded.id,
                impact: recorded.impact,
            },
            _ => AuditOutcome::AuditMismatch {
                breach_id: recorded.id,
                impact: recorded.impact,
            },
        };
        self.db
            .record_audit_outcome(date, outcome.marker(), self.clock.now())?;

        tx.commit().map_err(DatabaseError::from)?;
        Ok(outcome)
    }

    fn record_success(&self, date: NaiveDate) -> Result<AuditOutcome> {
        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;

        let streak = StreakEngine::new(self.db, self.clock).increment_streak()?;
        let outcome = AuditOutcome::Verified { streak };
        self.db
            .record_audit_outcome(date, outcome.marker(), self.clock.now())?;

        tx.commit().map_err(DatabaseError::from)?;
        Ok(outcome)
    }
}
