//! Streak state machine.
//!
//! One singleton row tracks the consecutive count of successfully audited
//! days, the all-time longest run, and a small pool of extender passes. A
//! pass absorbs one breach without resetting the streak; one pass is earned
//! every 20th streak day, capped at 3 (awards past the cap are dropped, not
//! queued).
//!
//! Concurrency discipline: both entry points are read-modify-write on the
//! same row. All calls go through a single SQLite connection, and callers
//! that pair a streak mutation with another write (breach recording, the
//! audit marker) open a transaction around the pair.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::LedgerDb;

/// A pass is earned at every 20th streak day.
pub const PASS_AWARD_INTERVAL: u32 = 20;

/// Pool ceiling for extender passes.
pub const PASS_CAP: u32 = 3;

/// The singleton streak row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_success_date: Option<NaiveDate>,
    pub extender_passes: u32,
    pub updated_at: DateTime<Utc>,
}

impl StreakState {
    /// All-zero state, used when the row is lazily created.
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            last_success_date: None,
            extender_passes: 0,
            updated_at: at,
        }
    }
}

/// What a breach did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BreachImpact {
    /// A pass was consumed; the streak survives.
    Absorbed { passes_left: u32 },
    /// No pass available; the streak went back to zero.
    Reset,
}

/// Result of a successful audit day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakIncrement {
    pub current: u32,
    pub longest: u32,
    pub pass_awarded: bool,
}

/// The only component allowed to mutate [`StreakState`].
pub struct StreakEngine<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
}

impl<'a> StreakEngine<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Current state, creating the zeroed row on first access.
    pub fn state(&self) -> Result<StreakState> {
        if let Some(state) = self.db.streak_state()? {
            return Ok(state);
        }
        let state = StreakState::empty(self.clock.now());
        self.db.upsert_streak_state(&state)?;
        Ok(state)
    }

    /// Apply a breach: consume a pass if one is available, reset otherwise.
    ///
    /// Does not open its own transaction; callers pairing this with a breach
    /// insert wrap both in one.
    pub fn handle_breach(&self) -> Result<BreachImpact> {
        let mut state = self.state()?;

        let impact = if state.extender_passes > 0 {
            state.extender_passes -= 1;
            BreachImpact::Absorbed {
                passes_left: state.extender_passes,
            }
        } else {
            state.current_streak = 0;
            BreachImpact::Reset
        };

        state.updated_at = self.clock.now();
        self.db.upsert_streak_state(&state)?;
        Ok(impact)
    }

    /// Record a successfully audited day. The only path that increases the
    /// streak.
    pub fn increment_streak(&self) -> Result<StreakIncrement> {
        let mut state = self.state()?;

        let new_streak = state.current_streak + 1;
        let pass_awarded =
            new_streak % PASS_AWARD_INTERVAL == 0 && state.extender_passes < PASS_CAP;
        if pass_awarded {
            state.extender_passes += 1;
        }

        state.current_streak = new_streak;
        state.longest_streak = state.longest_streak.max(new_streak);
        state.last_success_date = Some(self.clock.today());
        state.updated_at = self.clock.now();
        self.db.upsert_streak_state(&state)?;

        Ok(StreakIncrement {
            current: state.current_streak,
            longest: state.longest_streak,
            pass_awarded,
        })
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
    fn lazily_creates_zero_row() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        let state = engine.state().unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 0);
        assert_eq!(state.extender_passes, 0);
        assert!(state.last_success_date.is_none());

        // The row is persisted, not recreated per call.
        assert!(db.streak_state().unwrap().is_some());
    }

    #[test]
    fn streak_is_monotonic_until_reset() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        for expected in 1..=15u32 {
            let inc = engine.increment_streak().unwrap();
            assert_eq!(inc.current, expected);
            assert!(inc.longest >= expected);
        }

        let state = engine.state().unwrap();
        assert_eq!(state.current_streak, 15);
        assert_eq!(state.longest_streak, 15);
        assert_eq!(state.last_success_date, Some(date("2026-03-02")));
    }

    #[test]
    fn breach_without_pass_resets() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        for _ in 0..5 {
            engine.increment_streak().unwrap();
        }
        let impact = engine.handle_breach().unwrap();
        assert_eq!(impact, BreachImpact::Reset);

        let state = engine.state().unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 5);
    }

    #[test]
    fn pass_absorbs_breach() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        for _ in 0..20 {
            engine.increment_streak().unwrap();
        }
        let state = engine.state().unwrap();
        assert_eq!(state.extender_passes, 1);

        let impact = engine.handle_breach().unwrap();
        assert_eq!(impact, BreachImpact::Absorbed { passes_left: 0 });

        let state = engine.state().unwrap();
        assert_eq!(state.current_streak, 20, "absorbed breach keeps streak");
        assert_eq!(state.extender_passes, 0);

        // Pool empty now: the next breach resets.
        assert_eq!(engine.handle_breach().unwrap(), BreachImpact::Reset);
        assert_eq!(engine.state().unwrap().current_streak, 0);
    }

    #[test]
    fn pass_awarded_every_20th_day() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        for day in 1..=40u32 {
            let inc = engine.increment_streak().unwrap();
            assert_eq!(inc.pass_awarded, day % 20 == 0, "day {day}");
        }
        assert_eq!(engine.state().unwrap().extender_passes, 2);
    }

    #[test]
    fn pass_pool_never_exceeds_cap() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        // 100 consecutive days crosses five award thresholds; only three fit.
        for _ in 0..100 {
            let inc = engine.increment_streak().unwrap();
            assert!(engine.state().unwrap().extender_passes <= PASS_CAP);
            let _ = inc;
        }
        let state = engine.state().unwrap();
        assert_eq!(state.extender_passes, PASS_CAP);
        assert_eq!(state.current_streak, 100);

        // The award at day 80/100 was dropped, not queued: consuming one
        // pass leaves exactly two.
        engine.handle_breach().unwrap();
        assert_eq!(engine.state().unwrap().extender_passes, 2);
    }

    #[test]
    fn longest_streak_survives_reset() {
        let (db, clock) = setup();
        let engine = StreakEngine::new(&db, &clock);

        for _ in 0..7 {
            engine.increment_streak().unwrap();
        }
        engine.handle_breach().unwrap();
        for _ in 0..3 {
            engine.increment_streak().unwrap();
        }

        let state = engine.state().unwrap();
        assert_eq!(state.current_streak, 3);
        assert_eq!(state.longest_streak, 7);
        assert!(state.longest_streak >= state.current_streak);
    }
}
