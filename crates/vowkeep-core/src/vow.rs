//! Daily vow tracking.
//!
//! A vow is the morning declaration of intended actions, one row per
//! calendar day. Completion is one-way and idempotent: the first call wins
//! and later calls keep the original timestamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::storage::LedgerDb;

/// A daily vow: what the user committed to for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vow {
    pub id: i64,
    pub date: NaiveDate,
    pub items: Vec<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Records and completes the one-per-day vow.
pub struct VowTracker<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
}

impl<'a> VowTracker<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Record today's vow.
    ///
    /// Duplicate item labels are dropped, first occurrence wins.
    ///
    /// # Errors
    /// [`ValidationError::EmptyVow`] when `items` is empty,
    /// [`ValidationError::VowExists`] when today already has a vow.
    pub fn create_vow(&self, items: &[String]) -> Result<i64> {
        let mut deduped: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if !deduped.iter().any(|i| i == item) {
                deduped.push(item.to_string());
            }
        }
        if deduped.is_empty() {
            return Err(ValidationError::EmptyVow.into());
        }

        let today = self.clock.today();
        if self.db.vow_for_date(today)?.is_some() {
            return Err(ValidationError::VowExists { date: today }.into());
        }

        let id = self.db.insert_vow(today, &deduped, self.clock.now())?;
        Ok(id)
    }

    /// Mark today's vow completed.
    ///
    /// Returns `false` when no vow exists for today -- nothing to complete,
    /// not an error. A vow that is already completed keeps its original
    /// `completed_at`; the call still returns `true`.
    pub fn complete_vow(&self) -> Result<bool> {
        let today = self.clock.today();
        let vow = match self.db.vow_for_date(today)? {
            Some(vow) => vow,
            None => return Ok(false),
        };

        if !vow.completed {
            self.db.mark_vow_completed(vow.id, self.clock.now())?;
        }
        Ok(true)
    }

    /// Today's vow, if one was recorded.
    pub fn vow_for_today(&self) -> Result<Option<Vow>> {
        Ok(self.db.vow_for_date(self.clock.today())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn setup() -> (LedgerDb, FixedClock) {
        let db = LedgerDb::open_memory().unwrap();
        let clock = FixedClock::on(date("2026-03-02"));
        (db, clock)
    }

    #[test]
    fn creates_vow_for_today() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);

        let id = tracker
            .create_vow(&["inbox zero".into(), "ship parser".into()])
            .unwrap();
        assert!(id > 0);

        let vow = tracker.vow_for_today().unwrap().unwrap();
        assert_eq!(vow.date, date("2026-03-02"));
        assert_eq!(vow.items, vec!["inbox zero", "ship parser"]);
        assert!(!vow.completed);
    }

    #[test]
    fn rejects_empty_items() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);

        let err = tracker.create_vow(&[]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::EmptyVow)
        ));

        // Whitespace-only labels do not count either.
        let err = tracker.create_vow(&["   ".into()]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::EmptyVow)
        ));
    }

    #[test]
    fn rejects_second_vow_same_day() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);

        tracker.create_vow(&["a".into()]).unwrap();
        let err = tracker.create_vow(&["b".into()]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::VowExists { .. })
        ));

        // A new day opens a new slot.
        clock.advance_days(1);
        assert!(tracker.create_vow(&["b".into()]).is_ok());
    }

    #[test]
    fn dedupes_items_keeping_order() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);

        tracker
            .create_vow(&["run".into(), "read".into(), "run".into()])
            .unwrap();
        let vow = tracker.vow_for_today().unwrap().unwrap();
        assert_eq!(vow.items, vec!["run", "read"]);
    }

    #[test]
    fn complete_without_vow_is_noop() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);

        assert!(!tracker.complete_vow().unwrap());
    }

    #[test]
    fn completion_is_idempotent_and_keeps_first_timestamp() {
        let (db, clock) = setup();
        let tracker = VowTracker::new(&db, &clock);
        tracker.create_vow(&["a".into()]).unwrap();

        assert!(tracker.complete_vow().unwrap());
        let first = tracker.vow_for_today().unwrap().unwrap();
        let first_at = first.completed_at.unwrap();

        // Later in the day the user taps complete again.
        clock.set_now(first_at + chrono::Duration::hours(3));
        assert!(tracker.complete_vow().unwrap());

        let second = tracker.vow_for_today().unwrap().unwrap();
        assert_eq!(second.completed_at.unwrap(), first_at);
    }
}
