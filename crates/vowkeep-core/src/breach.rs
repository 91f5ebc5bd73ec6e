//! Breach recording, querying, and repair.
//!
//! Recording a breach and applying its streak consequence are one logical
//! operation: both run inside a single transaction so a crash cannot leave a
//! breach row without the pass consumption / reset that belongs to it.
//!
//! Repair is one-way and never touches the streak; it only changes how the
//! scoring engine weighs the breach.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{DatabaseError, Result};
use crate::storage::{LedgerDb, RepairConfig};
use crate::streak::{BreachImpact, StreakEngine};

/// What kind of integrity violation a breach records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachKind {
    /// The morning vow window passed without a vow.
    MissedVow,
    /// No claim was submitted for the audited day.
    MissedClaim,
    /// A claim exists but external evidence does not back it.
    AuditMismatch,
    /// A pattern interruption was dismissed without acting on it.
    IgnoredInterruption,
}

impl BreachKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachKind::MissedVow => "missed_vow",
            BreachKind::MissedClaim => "missed_claim",
            BreachKind::AuditMismatch => "audit_mismatch",
            BreachKind::IgnoredInterruption => "ignored_interruption",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missed_vow" => Some(BreachKind::MissedVow),
            "missed_claim" => Some(BreachKind::MissedClaim),
            "audit_mismatch" => Some(BreachKind::AuditMismatch),
            "ignored_interruption" => Some(BreachKind::IgnoredInterruption),
            _ => None,
        }
    }
}

/// A recorded integrity violation for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breach {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: BreachKind,
    pub reason: String,
    pub repaired: bool,
    pub repaired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A freshly recorded breach and what it did to the streak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordedBreach {
    pub id: i64,
    pub impact: BreachImpact,
}

/// Records, queries, and repairs breaches.
pub struct BreachLedger<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
    lookback_days: i64,
}

impl<'a> BreachLedger<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock, repair: &RepairConfig) -> Self {
        Self {
            db,
            clock,
            lookback_days: repair.lookback_days,
        }
    }

    /// Record a breach dated today.
    pub fn record_breach(&self, kind: BreachKind, reason: &str) -> Result<RecordedBreach> {
        self.record_breach_for(kind, reason, self.clock.today())
    }

    /// Record a breach for an explicit date (the audit dates breaches to the
    /// day being audited, not the day the audit runs).
    pub fn record_breach_for(
        &self,
        kind: BreachKind,
        reason: &str,
        date: NaiveDate,
    ) -> Result<RecordedBreach> {
        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;
        let recorded = self.record_in_tx(kind, reason, date)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(recorded)
    }

    /// Insert + streak consequence without opening a transaction. The caller
    /// owns the enclosing transaction.
    pub(crate) fn record_in_tx(
        &self,
        kind: BreachKind,
        reason: &str,
        date: NaiveDate,
    ) -> Result<RecordedBreach> {
        let id = self.db.insert_breach(date, kind, reason, self.clock.now())?;
        let impact = StreakEngine::new(self.db, self.clock).handle_breach()?;
        Ok(RecordedBreach { id, impact })
    }

    /// Mark a breach repaired.
    ///
    /// Returns `false` -- a documented no-op, not an error -- when the id is
    /// not found within the lookback window or the breach is already
    /// repaired. Repair never modifies the streak.
    pub fn repair_breach(&self, id: i64) -> Result<bool> {
        let today = self.clock.today();
        let window_start = today - chrono::Duration::days(self.lookback_days);

        let breach = match self.db.breach_by_id(id)? {
            Some(b) if b.date >= window_start && b.date <= today => b,
            _ => return Ok(false),
        };
        if breach.repaired {
            return Ok(false);
        }

        self.db.mark_breach_repaired(id, self.clock.now())?;
        Ok(true)
    }

    /// Unrepaired breach count over the inclusive range.
    pub fn count_unrepaired(&self, start: NaiveDate, end: NaiveDate) -> Result<u32> {
        Ok(self.db.count_unrepaired(start, end)?)
    }

    /// Repaired breach count over the inclusive range.
    pub fn count_repaired(&self, start: NaiveDate, end: NaiveDate) -> Result<u32> {
        Ok(self.db.count_repaired(start, end)?)
    }

    /// Distinct dates carrying at least one unrepaired breach.
    pub fn debt_days(&self, start: NaiveDate, end: NaiveDate) -> Result<u32> {
        Ok(self.db.debt_days(start, end)?)
    }

    /// Full breach rows over the inclusive range, newest first.
    pub fn breaches_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Breach>> {
        Ok(self.db.breaches_in_range(start, end)?)
    }
}
