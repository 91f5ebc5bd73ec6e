//! Evening claim tracking.
//!
//! A claim is the end-of-day retrospective tied to that day's vow. The
//! reflection checklist keys come from configuration (see
//! [`ReflectionConfig`]); missing configured keys are seeded `false` and
//! unknown extension keys ride along untouched.
//!
//! Reflection completeness is a documented contract rather than an
//! unconditional runtime check -- completion data may arrive from a batch
//! import. Construct the tracker with [`ClaimTracker::strict`] to enforce it
//! (the default for tests).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{NotFoundError, Result, ValidationError};
use crate::storage::{LedgerDb, ReflectionConfig};

/// A daily claim: the retrospective confirming or denying the vow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub date: NaiveDate,
    pub vow_id: i64,
    /// Checklist key -> confirmed. All values must be true for the claim to
    /// be completable.
    pub reflection_items: BTreeMap<String, bool>,
    /// Orthogonal daily ritual flag; gating on it is the caller's job.
    pub ritual_completed: bool,
    /// Opaque external evidence reference (e.g. a commit sha), recorded on
    /// completion.
    pub evidence_ref: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Records and completes the one-per-day claim.
pub struct ClaimTracker<'a> {
    db: &'a LedgerDb,
    clock: &'a dyn Clock,
    reflection_keys: Vec<String>,
    strict: bool,
}

impl<'a> ClaimTracker<'a> {
    pub fn new(db: &'a LedgerDb, clock: &'a dyn Clock, reflection: &ReflectionConfig) -> Self {
        Self {
            db,
            clock,
            reflection_keys: reflection.keys.clone(),
            strict: false,
        }
    }

    /// Like [`ClaimTracker::new`], but `complete_claim` rejects claims whose
    /// reflection checklist is not fully confirmed.
    pub fn strict(db: &'a LedgerDb, clock: &'a dyn Clock, reflection: &ReflectionConfig) -> Self {
        Self {
            strict: true,
            ..Self::new(db, clock, reflection)
        }
    }

    /// Record today's claim against `vow_id`.
    ///
    /// # Errors
    /// [`ValidationError::ClaimExists`] when today already has a claim,
    /// [`NotFoundError::Vow`] when `vow_id` does not reference a stored vow.
    pub fn create_claim(
        &self,
        vow_id: i64,
        reflection_items: BTreeMap<String, bool>,
        ritual_completed: bool,
    ) -> Result<i64> {
        let today = self.clock.today();
        if self.db.claim_for_date(today)?.is_some() {
            return Err(ValidationError::ClaimExists { date: today }.into());
        }
        if self.db.vow_by_id(vow_id)?.is_none() {
            return Err(NotFoundError::Vow { id: vow_id }.into());
        }

        let mut items = reflection_items;
        for key in &self.reflection_keys {
            items.entry(key.clone()).or_insert(false);
        }

        let id = self
            .db
            .insert_claim(today, vow_id, &items, ritual_completed, self.clock.now())?;
        Ok(id)
    }

    /// Complete today's claim, storing `evidence_ref` alongside.
    ///
    /// # Errors
    /// [`NotFoundError::Claim`] when today has no claim or `id` does not
    /// match it. In strict mode,
    /// [`ValidationError::ReflectionIncomplete`] when any checklist value is
    /// still false.
    pub fn complete_claim(&self, id: i64, evidence_ref: Option<&str>) -> Result<bool> {
        let today = self.clock.today();
        let claim = self
            .db
            .claim_for_date(today)?
            .filter(|c| c.id == id)
            .ok_or(NotFoundError::Claim { date: today })?;

        if self.strict {
            let missing: Vec<String> = claim
                .reflection_items
                .iter()
                .filter(|(_, &done)| !done)
                .map(|(key, _)| key.clone())
                .collect();
            if !missing.is_empty() {
                return Err(ValidationError::ReflectionIncomplete { missing }.into());
            }
        }

        if !claim.completed {
            self.db
                .mark_claim_completed(claim.id, evidence_ref, self.clock.now())?;
        }
        Ok(true)
    }

    /// Flip one reflection checklist entry on today's claim.
    pub fn set_reflection_item(&self, key: &str, done: bool) -> Result<()> {
        let today = self.clock.today();
        let mut claim = self
            .db
            .claim_for_date(today)?
            .ok_or(NotFoundError::Claim { date: today })?;
        claim.reflection_items.insert(key.to_string(), done);
        self.db
            .update_reflection_items(claim.id, &claim.reflection_items)?;
        Ok(())
    }

    /// Today's claim, if one was recorded.
    pub fn claim_for_today(&self) -> Result<Option<Claim>> {
        Ok(self.db.claim_for_date(self.clock.today())?)
    }

    /// The claim recorded for `date`, if any.
    pub fn claim_for_date(&self, date: NaiveDate) -> Result<Option<Claim>> {
        Ok(self.db.claim_for_date(date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::CoreError;
    use crate::vow::VowTracker;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn setup() -> (LedgerDb, FixedClock, ReflectionConfig) {
        let db = LedgerDb::open_memory().unwrap();
        let clock = FixedClock::on(date("2026-03-02"));
        (db, clock, ReflectionConfig::default())
    }

    fn vow_id(db: &LedgerDb, clock: &FixedClock) -> i64 {
        VowTracker::new(db, clock)
            .create_vow(&["ship".into()])
            .unwrap()
    }

    fn all_confirmed(reflection: &ReflectionConfig) -> BTreeMap<String, bool> {
        reflection
            .keys
            .iter()
            .map(|k| (k.clone(), true))
            .collect()
    }

    #[test]
    fn create_seeds_missing_configured_keys() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::new(&db, &clock, &reflection);

        let mut items = BTreeMap::new();
        items.insert("kept_vow".to_string(), true);
        items.insert("evening_walk".to_string(), true); // extension key
        tracker.create_claim(vow, items, false).unwrap();

        let claim = tracker.claim_for_today().unwrap().unwrap();
        for key in &reflection.keys {
            assert!(claim.reflection_items.contains_key(key), "missing {key}");
        }
        assert_eq!(claim.reflection_items["kept_vow"], true);
        assert_eq!(claim.reflection_items["inbox_zero"], false);
        assert_eq!(claim.reflection_items["evening_walk"], true);
    }

    #[test]
    fn rejects_second_claim_same_day() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::new(&db, &clock, &reflection);

        tracker.create_claim(vow, BTreeMap::new(), false).unwrap();
        let err = tracker
            .create_claim(vow, BTreeMap::new(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ClaimExists { .. })
        ));
    }

    #[test]
    fn rejects_unknown_vow_reference() {
        let (db, clock, reflection) = setup();
        let tracker = ClaimTracker::new(&db, &clock, &reflection);

        let err = tracker
            .create_claim(999, BTreeMap::new(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound(NotFoundError::Vow { id: 999 })
        ));
    }

    #[test]
    fn complete_requires_todays_claim() {
        let (db, clock, reflection) = setup();
        let tracker = ClaimTracker::new(&db, &clock, &reflection);

        let err = tracker.complete_claim(1, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound(NotFoundError::Claim { .. })
        ));
    }

    #[test]
    fn complete_rejects_mismatched_id() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::new(&db, &clock, &reflection);
        let id = tracker.create_claim(vow, BTreeMap::new(), false).unwrap();

        let err = tracker.complete_claim(id + 1, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound(NotFoundError::Claim { .. })
        ));
    }

    #[test]
    fn complete_stores_evidence() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::new(&db, &clock, &reflection);
        let id = tracker
            .create_claim(vow, all_confirmed(&reflection), true)
            .unwrap();

        assert!(tracker.complete_claim(id, Some("abc1234")).unwrap());
        let claim = tracker.claim_for_today().unwrap().unwrap();
        assert!(claim.completed);
        assert_eq!(claim.evidence_ref.as_deref(), Some("abc1234"));
        assert!(claim.completed_at.is_some());
    }

    #[test]
    fn strict_mode_rejects_incomplete_reflection() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::strict(&db, &clock, &reflection);

        let mut items = all_confirmed(&reflection);
        items.insert("guilt_zero".to_string(), false);
        let id = tracker.create_claim(vow, items, false).unwrap();

        let err = tracker.complete_claim(id, None).unwrap_err();
        match err {
            CoreError::Validation(ValidationError::ReflectionIncomplete { missing }) => {
                assert_eq!(missing, vec!["guilt_zero".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Confirming the item unblocks completion.
        tracker.set_reflection_item("guilt_zero", true).unwrap();
        assert!(tracker.complete_claim(id, None).unwrap());
    }

    #[test]
    fn completion_keeps_first_timestamp() {
        let (db, clock, reflection) = setup();
        let vow = vow_id(&db, &clock);
        let tracker = ClaimTracker::new(&db, &clock, &reflection);
        let id = tracker.create_claim(vow, BTreeMap::new(), false).unwrap();

        tracker.complete_claim(id, Some("sha1")).unwrap();
        let first = tracker.claim_for_today().unwrap().unwrap();

        clock.set_now(first.completed_at.unwrap() + chrono::Duration::hours(1));
        tracker.complete_claim(id, Some("sha2")).unwrap();

        let second = tracker.claim_for_today().unwrap().unwrap();
        assert_eq!(second.completed_at, first.completed_at);
        assert_eq!(second.evidence_ref.as_deref(), Some("sha1"));
    }
}
