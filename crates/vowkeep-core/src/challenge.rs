//! Multi-day challenge tracking.
//!
//! A challenge is an ordered list of daily items (classically 30) worked
//! through one day at a time. At most one challenge is active; starting a
//! new one deactivates the old. The claim's ritual flag is the UI-level
//! link to the day's challenge item -- the ledger keeps them decoupled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{NotFoundError, Result, ValidationError};
use crate::storage::LedgerDb;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub start_date: NaiveDate,
    /// Daily items in order.
    pub items: Vec<String>,
    pub active: bool,
    pub completed_days: u32,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// The item for the next uncompleted day, if any remain.
    pub fn current_item(&self) -> Option<&str> {
        self.items
            .get(self.completed_days as usize)
            .map(String::as_str)
    }
}

/// Starts, advances, and retires challenges.
pub struct ChallengeTracker<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
}

impl<'a> ChallengeTracker<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Start a challenge today, deactivating any currently active one.
    ///
    /// # Errors
    /// [`ValidationError::EmptyChallenge`] when `items` is empty.
    pub fn start_challenge(&self, items: &[String]) -> Result<i64> {
        if items.is_empty() {
            return Err(ValidationError::EmptyChallenge.into());
        }
        self.db.deactivate_challenges()?;
        let id = self
            .db
            .insert_challenge(self.clock.today(), items, self.clock.now())?;
        Ok(id)
    }

    /// The active challenge, if one exists.
    pub fn active_challenge(&self) -> Result<Option<Challenge>> {
        Ok(self.db.active_challenge()?)
    }

    /// Mark one more day complete. Returns the new completed-day count.
    /// Completing the final day retires the challenge.
    ///
    /// # Errors
    /// [`NotFoundError::Challenge`] when no challenge is active.
    pub fn record_day(&self) -> Result<u32> {
        let challenge = self
            .db
            .active_challenge()?
            .ok_or(NotFoundError::Challenge)?;

        let total = challenge.items.len() as u32;
        let completed = (challenge.completed_days + 1).min(total);
        let still_active = completed < total;
        self.db
            .set_challenge_progress(challenge.id, completed, still_active)?;
        Ok(completed)
    }

    /// Retire the active challenge without finishing it. Returns `false`
    /// when none was active.
    pub fn deactivate(&self) -> Result<bool> {
        Ok(self.db.deactivate_challenges()? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::CoreError;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn setup() -> (LedgerDb, FixedClock) {
        let db = LedgerDb::open_memory().unwrap();
        let clock = FixedClock::on(date("2026-03-02"));
        (db, clock)
    }

    fn items(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("day {i}")).collect()
    }

    #[test]
    fn starts_and_reads_active_challenge() {
        let (db, clock) = setup();
        let tracker = ChallengeTracker::new(&db, &clock);

        tracker.start_challenge(&items(30)).unwrap();
        let challenge = tracker.active_challenge().unwrap().unwrap();
        assert_eq!(challenge.start_date, date("2026-03-02"));
        assert_eq!(challenge.items.len(), 30);
        assert_eq!(challenge.completed_days, 0);
        assert_eq!(challenge.current_item(), Some("day 1"));
    }

    #[test]
    fn rejects_empty_challenge() {
        let (db, clock) = setup();
        let tracker = ChallengeTracker::new(&db, &clock);
        let err = tracker.start_challenge(&[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyChallenge)
        ));
    }

    #[test]
    fn starting_replaces_active_challenge() {
        let (db, clock) = setup();
        let tracker = ChallengeTracker::new(&db, &clock);

        tracker.start_challenge(&items(5)).unwrap();
        let second = tracker.start_challenge(&items(3)).unwrap();

        let active = tracker.active_challenge().unwrap().unwrap();
        assert_eq!(active.id, second);
        assert_eq!(active.items.len(), 3);
    }

    #[test]
    fn record_day_advances_and_retires() {
        let (db, clock) = setup();
        let tracker = ChallengeTracker::new(&db, &clock);
        tracker.start_challenge(&items(3)).unwrap();

        assert_eq!(tracker.record_day().unwrap(), 1);
        assert_eq!(tracker.record_day().unwrap(), 2);
        assert_eq!(
            tracker.active_challenge().unwrap().unwrap().current_item(),
            Some("day 3")
        );

        assert_eq!(tracker.record_day().unwrap(), 3);
        assert!(tracker.active_challenge().unwrap().is_none());

        let err = tracker.record_day().unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound(NotFoundError::Challenge)
        ));
    }

    #[test]
    fn deactivate_is_explicit_retirement() {
        let (db, clock) = setup();
        let tracker = ChallengeTracker::new(&db, &clock);

        assert!(!tracker.deactivate().unwrap());
        tracker.start_challenge(&items(10)).unwrap();
        assert!(tracker.deactivate().unwrap());
        assert!(tracker.active_challenge().unwrap().is_none());
    }
}
