//! Integrity score computation.
//!
//! The score is a decaying function of unrepaired breaches over a period,
//! with a fixed cost per repair and an absolute floor of 12.0 -- integrity
//! degrades but is never reported as totally lost. Each computation appends
//! a history row; computed fields are deterministic for a given ledger
//! state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::storage::LedgerDb;
use crate::streak::StreakEngine;

/// Reported scores never drop below this.
pub const SCORE_FLOOR: f64 = 12.0;

const PENALTY_EXPONENT: f64 = 1.35;
const PENALTY_SCALE: f64 = 1.25;
const REPAIR_COST: f64 = 0.5;

/// One scoring snapshot. Append-only; later computations add new rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityScore {
    pub id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub score: f64,
    pub breach_count: u32,
    pub repair_count: u32,
    /// Current streak at computation time, read fresh.
    pub streak_days: u32,
    /// Distinct dates in the period with at least one unrepaired breach.
    pub debt_days: u32,
    pub calculated_at: DateTime<Utc>,
}

/// The penalty model, as a pure function of the period counts.
///
/// `base = max(12, 100 * (1 - min(1, breaches^1.35 / (days * 1.25))))`,
/// then `max(12, base - repairs * 0.5)`.
pub fn compute_score(days: i64, breaches: u32, repairs: u32) -> f64 {
    let breach_penalty =
        (f64::from(breaches).powf(PENALTY_EXPONENT) / (days as f64 * PENALTY_SCALE)).min(1.0);
    let base = (100.0 * (1.0 - breach_penalty)).max(SCORE_FLOOR);
    (base - f64::from(repairs) * REPAIR_COST).max(SCORE_FLOOR)
}

/// Computes and persists integrity scores from ledger state.
pub struct ScoringEngine<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Score the inclusive period `[start, end]`, appending a history row.
    ///
    /// # Errors
    /// [`ValidationError::InvalidDateRange`] when the period spans no days.
    pub fn calculate_score(&self, start: NaiveDate, end: NaiveDate) -> Result<IntegrityScore> {
        let days = (end - start).num_days() + 1;
        if days <= 0 {
            return Err(ValidationError::InvalidDateRange { start, end }.into());
        }

        let breaches = self.db.count_unrepaired(start, end)?;
        let repairs = self.db.count_repaired(start, end)?;
        let debt_days = self.db.debt_days(start, end)?;
        let streak_days = StreakEngine::new(self.db, self.clock)
            .state()?
            .current_streak;

        let mut score = IntegrityScore {
            id: 0,
            period_start: start,
            period_end: end,
            score: compute_score(days, breaches, repairs),
            breach_count: breaches,
            repair_count: repairs,
            streak_days,
            debt_days,
            calculated_at: self.clock.now(),
        };
        score.id = self.db.insert_score(&score)?;
        Ok(score)
    }

    /// Score history, latest period first.
    pub fn recent_scores(&self, limit: u32) -> Result<Vec<IntegrityScore>> {
        Ok(self.db.recent_scores(limit)?)
    }

    /// The most recently computed score, if any.
    pub fn latest(&self) -> Result<Option<IntegrityScore>> {
        Ok(self.db.recent_scores(1)?.into_iter().next())
    }
}
