//! # Vowkeep Core Library
//!
//! This library provides the core business logic for Vowkeep, a personal
//! integrity ledger: declare a daily vow, claim it in the evening, get
//! audited against external commit evidence the next morning, and carry a
//! score that reflects consistency, breaches, and repairs over time.
//!
//! ## Architecture
//!
//! - **Ledger**: SQLite-backed storage for vows, claims, breaches, streak
//!   state, and score history
//! - **Rule engines**: breach recording with streak consequences, an
//!   extender-pass streak machine, and a decaying integrity score
//! - **Daily audit**: the one procedure where everything composes -- it
//!   reconciles yesterday's claim against a verification provider
//! - **Verification**: GitHub commit lookup with a local-evidence fallback
//!
//! Time is injected ([`Clock`]) and verification is a narrow trait
//! ([`verify::VerificationProvider`]), so every rule is testable with a
//! fixed calendar and canned evidence.
//!
//! ## Key Components
//!
//! - [`VowTracker`] / [`ClaimTracker`]: the one-per-day entities
//! - [`BreachLedger`]: records, queries, and repairs violations
//! - [`StreakEngine`]: the only mutator of streak state
//! - [`ScoringEngine`]: appends score snapshots
//! - [`DailyAudit`]: the morning-after reconciliation

pub mod audit;
pub mod breach;
pub mod challenge;
pub mod claim;
pub mod clock;
pub mod error;
pub mod notify;
pub mod score;
pub mod storage;
pub mod streak;
pub mod verify;
pub mod vow;

pub use audit::{AuditOutcome, DailyAudit};
pub use breach::{Breach, BreachKind, BreachLedger, RecordedBreach};
pub use challenge::{Challenge, ChallengeTracker};
pub use claim::{Claim, ClaimTracker};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{
    ConfigError, CoreError, DatabaseError, NotFoundError, Result, ValidationError,
    VerificationError,
};
pub use notify::{ConsoleNotifier, NoopNotifier, Notifier};
pub use score::{IntegrityScore, ScoringEngine, SCORE_FLOOR};
pub use storage::{Config, LedgerDb};
pub use streak::{BreachImpact, StreakEngine, StreakIncrement, StreakState};
pub use verify::{ChainVerifier, FixedVerifier, GithubVerifier, LocalEvidenceVerifier};
pub use vow::{Vow, VowTracker};
