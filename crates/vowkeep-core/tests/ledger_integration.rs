//! Cross-component ledger tests: manual breaches, repairs, challenges, and
//! audit wiring through the chain verifier with local evidence.

use std::collections::BTreeMap;

use vowkeep_core::audit::{AuditOutcome, DailyAudit};
use vowkeep_core::breach::{BreachKind, BreachLedger};
use vowkeep_core::challenge::ChallengeTracker;
use vowkeep_core::claim::ClaimTracker;
use vowkeep_core::clock::{Clock, FixedClock};
use vowkeep_core::error::VerificationError;
use vowkeep_core::score::ScoringEngine;
use vowkeep_core::storage::{Config, LedgerDb};
use vowkeep_core::streak::{BreachImpact, StreakEngine};
use vowkeep_core::verify::{ChainVerifier, LocalEvidenceVerifier, VerificationProvider};
use vowkeep_core::vow::VowTracker;

fn date(s: &str) -> chrono::NaiveDate {
    s.parse().unwrap()
}

#[test]
fn manual_breach_repair_and_score() {
    let db = LedgerDb::open_memory().unwrap();
    let config = Config::default();
    let clock = FixedClock::on(date("2026-03-05"));

    let streak = StreakEngine::new(&db, &clock);
    for _ in 0..3 {
        streak.increment_streak().unwrap();
    }

    // The user dismissed a pattern interruption; some other caller records it.
    let ledger = BreachLedger::new(&db, &clock, &config.repair);
    let recorded = ledger
        .record_breach(BreachKind::IgnoredInterruption, "dismissed the nudge")
        .unwrap();
    assert_eq!(recorded.impact, BreachImpact::Reset);

    // Repairing acknowledges the breach but costs half a point at scoring.
    assert!(ledger.repair_breach(recorded.id).unwrap());

    let score = ScoringEngine::new(&db, &clock)
        .calculate_score(date("2026-03-01"), date("2026-03-07"))
        .unwrap();
    assert_eq!(score.breach_count, 0);
    assert_eq!(score.repair_count, 1);
    assert_eq!(score.debt_days, 0);
    assert!((score.score - 99.5).abs() < 1e-9, "got {}", score.score);
}

#[test]
fn audit_falls_back_to_local_evidence_when_remote_is_down() {
    struct Down;
    impl VerificationProvider for Down {
        fn was_verified(
            &self,
            _date: chrono::NaiveDate,
        ) -> Result<bool, VerificationError> {
            Err(VerificationError::Transient("connection refused".into()))
        }
    }

    let db = LedgerDb::open_memory().unwrap();
    let config = Config::default();
    let clock = FixedClock::on(date("2026-03-02"));

    // The evening flow: vow, claim, completion writes the local evidence note.
    let logs = tempfile::tempdir().unwrap();
    let local = LocalEvidenceVerifier::new(logs.path().join("logs"));
    let vow = VowTracker::new(&db, &clock)
        .create_vow(&["commit".into()])
        .unwrap();
    let claims = ClaimTracker::new(&db, &clock, &config.reflection);
    let id = claims.create_claim(vow, BTreeMap::new(), true).unwrap();
    claims.complete_claim(id, Some("deadbeef")).unwrap();
    local
        .write_evidence(clock.today(), "claim complete, commit deadbeef")
        .unwrap();

    // Next morning the API is unreachable, but the note carries the audit.
    clock.advance_days(1);
    let down = Down;
    let chain = ChainVerifier::new(&down, &local);
    let outcome = DailyAudit::new(&db, &clock, &chain).run().unwrap();
    assert!(matches!(outcome, AuditOutcome::Verified { .. }));
}

#[test]
fn challenge_runs_alongside_the_ledger() {
    let db = LedgerDb::open_memory().unwrap();
    let clock = FixedClock::on(date("2026-03-02"));
    let challenges = ChallengeTracker::new(&db, &clock);

    let items: Vec<String> = (1..=30).map(|i| format!("challenge {i}")).collect();
    challenges.start_challenge(&items).unwrap();

    for day in 1..=10 {
        assert_eq!(challenges.record_day().unwrap(), day);
        clock.advance_days(1);
    }

    let active = challenges.active_challenge().unwrap().unwrap();
    assert_eq!(active.completed_days, 10);
    assert_eq!(active.current_item(), Some("challenge 11"));

    // Challenge progress never leaks into streak or breach state.
    assert_eq!(
        StreakEngine::new(&db, &clock).state().unwrap().current_streak,
        0
    );
}
