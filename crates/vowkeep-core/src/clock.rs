//! Injected clock.
//!
//! The ledger never reads the system clock directly -- every component takes
//! a `&dyn Clock` so date-window and gating rules are testable with a fixed
//! calendar position.

use std::cell::Cell;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "today" and "now" for all ledger components.
pub trait Clock {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;

    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests and replay tooling.
///
/// Interior mutability lets a test advance the calendar without re-wiring
/// the components that borrow the clock.
#[derive(Debug)]
pub struct FixedClock {
    today: Cell<NaiveDate>,
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    /// Pin the clock to `date`, with "now" at 08:00 UTC that day.
    pub fn on(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(8, 0, 0)
            .expect("08:00 is a valid wall time")
            .and_utc();
        Self {
            today: Cell::new(date),
            now: Cell::new(now),
        }
    }

    /// Move the calendar forward (or back) by whole days.
    pub fn advance_days(&self, days: i64) {
        let today = self.today.get() + chrono::Duration::days(days);
        self.today.set(today);
        self.now.set(self.now.get() + chrono::Duration::days(days));
    }

    /// Override the instant returned by [`Clock::now`].
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today.get()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
