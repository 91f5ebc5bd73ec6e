//! SQLite-based ledger storage.
//!
//! Single-file database holding the five ledger entities plus the audit
//! outcome log. The connection is the serialization point: all writers in a
//! process share it, and multi-row operations (breach + streak, audit
//! outcome + mutation) run inside transactions opened by the calling
//! component.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations};
use crate::breach::{Breach, BreachKind};
use crate::challenge::Challenge;
use crate::claim::Claim;
use crate::error::{CoreError, DatabaseError};
use crate::score::IntegrityScore;
use crate::streak::StreakState;
use crate::vow::Vow;

// === Row mapping helpers ===

fn bad_column(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse()
        .map_err(|e| bad_column(idx, format!("bad date '{s}': {e}")))
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| bad_column(idx, format!("bad timestamp '{s}': {e}")))
}

fn parse_opt_ts(idx: usize, s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_ts(idx, &s)).transpose()
}

fn parse_kind(idx: usize, s: &str) -> rusqlite::Result<BreachKind> {
    BreachKind::parse(s).ok_or_else(|| bad_column(idx, format!("unknown breach kind '{s}'")))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| bad_column(idx, format!("bad JSON column: {e}")))
}

fn row_to_vow(row: &rusqlite::Row) -> rusqlite::Result<Vow> {
    Ok(Vow {
        id: row.get(0)?,
        date: parse_date(1, &row.get::<_, String>(1)?)?,
        items: parse_json(2, &row.get::<_, String>(2)?)?,
        completed: row.get(3)?,
        completed_at: parse_opt_ts(4, row.get(4)?)?,
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}

fn row_to_claim(row: &rusqlite::Row) -> rusqlite::Result<Claim> {
    Ok(Claim {
        id: row.get(0)?,
        date: parse_date(1, &row.get::<_, String>(1)?)?,
        vow_id: row.get(2)?,
        reflection_items: parse_json(3, &row.get::<_, String>(3)?)?,
        ritual_completed: row.get(4)?,
        evidence_ref: row.get(5)?,
        completed: row.get(6)?,
        completed_at: parse_opt_ts(7, row.get(7)?)?,
        created_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}

fn row_to_breach(row: &rusqlite::Row) -> rusqlite::Result<Breach> {
    Ok(Breach {
        id: row.get(0)?,
        date: parse_date(1, &row.get::<_, String>(1)?)?,
        kind: parse_kind(2, &row.get::<_, String>(2)?)?,
        reason: row.get(3)?,
        repaired: row.get(4)?,
        repaired_at: parse_opt_ts(5, row.get(5)?)?,
        created_at: parse_ts(6, &row.get::<_, String>(6)?)?,
    })
}

fn row_to_score(row: &rusqlite::Row) -> rusqlite::Result<IntegrityScore> {
    Ok(IntegrityScore {
        id: row.get(0)?,
        period_start: parse_date(1, &row.get::<_, String>(1)?)?,
        period_end: parse_date(2, &row.get::<_, String>(2)?)?,
        score: row.get(3)?,
        breach_count: row.get(4)?,
        repair_count: row.get(5)?,
        streak_days: row.get(6)?,
        debt_days: row.get(7)?,
        calculated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}

fn row_to_challenge(row: &rusqlite::Row) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: row.get(0)?,
        start_date: parse_date(1, &row.get::<_, String>(1)?)?,
        items: parse_json(2, &row.get::<_, String>(2)?)?,
        active: row.get(3)?,
        completed_days: row.get(4)?,
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}

const VOW_COLS: &str = "id, date, items, completed, completed_at, created_at";
const CLAIM_COLS: &str =
    "id, date, vow_id, reflection_items, ritual_completed, evidence_ref, completed, completed_at, created_at";
const BREACH_COLS: &str = "id, date, kind, reason, repaired, repaired_at, created_at";
const SCORE_COLS: &str =
    "id, period_start, period_end, score, breach_count, repair_count, streak_days, debt_days, calculated_at";
const CHALLENGE_COLS: &str = "id, start_date, items, active, completed_days, created_at";

/// SQLite database owning all persisted ledger rows.
pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/vowkeep/vowkeep.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("vowkeep.db");
        Self::open_at(&path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS vows (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    date         TEXT NOT NULL UNIQUE,
                    items        TEXT NOT NULL DEFAULT '[]',
                    completed    INTEGER NOT NULL DEFAULT 0,
                    completed_at TEXT,
                    created_at   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS claims (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    date             TEXT NOT NULL UNIQUE,
                    vow_id           INTEGER NOT NULL REFERENCES vows(id),
                    reflection_items TEXT NOT NULL DEFAULT '{}',
                    ritual_completed INTEGER NOT NULL DEFAULT 0,
                    evidence_ref     TEXT,
                    completed        INTEGER NOT NULL DEFAULT 0,
                    completed_at     TEXT,
                    created_at       TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS breaches (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    date        TEXT NOT NULL,
                    kind        TEXT NOT NULL,
                    reason      TEXT NOT NULL,
                    repaired    INTEGER NOT NULL DEFAULT 0,
                    repaired_at TEXT,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS streak_state (
                    id                INTEGER PRIMARY KEY CHECK (id = 1),
                    current_streak    INTEGER NOT NULL DEFAULT 0,
                    longest_streak    INTEGER NOT NULL DEFAULT 0,
                    last_success_date TEXT,
                    extender_passes   INTEGER NOT NULL DEFAULT 0,
                    updated_at        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS integrity_scores (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    period_start  TEXT NOT NULL,
                    period_end    TEXT NOT NULL,
                    score         REAL NOT NULL,
                    breach_count  INTEGER NOT NULL,
                    repair_count  INTEGER NOT NULL,
                    streak_days   INTEGER NOT NULL,
                    debt_days     INTEGER NOT NULL,
                    calculated_at TEXT NOT NULL
                );

                -- Common query patterns: range scans by date.
                CREATE INDEX IF NOT EXISTS idx_breaches_date ON breaches(date);
                CREATE INDEX IF NOT EXISTS idx_breaches_date_repaired ON breaches(date, repaired);
                CREATE INDEX IF NOT EXISTS idx_scores_period_start ON integrity_scores(period_start);",
            )
            .map_err(DatabaseError::from)?;

        // Run incremental migrations (v1 -> v2 -> v3, etc.)
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Vows ===

    pub fn insert_vow(
        &self,
        date: NaiveDate,
        items: &[String],
        created_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO vows (date, items, completed, created_at) VALUES (?1, ?2, 0, ?3)",
            params![
                date.to_string(),
                serde_json::to_string(items).unwrap_or_else(|_| "[]".into()),
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn vow_for_date(&self, date: NaiveDate) -> Result<Option<Vow>, DatabaseError> {
        let vow = self
            .conn
            .query_row(
                &format!("SELECT {VOW_COLS} FROM vows WHERE date = ?1"),
                params![date.to_string()],
                row_to_vow,
            )
            .optional()?;
        Ok(vow)
    }

    pub fn vow_by_id(&self, id: i64) -> Result<Option<Vow>, DatabaseError> {
        let vow = self
            .conn
            .query_row(
                &format!("SELECT {VOW_COLS} FROM vows WHERE id = ?1"),
                params![id],
                row_to_vow,
            )
            .optional()?;
        Ok(vow)
    }

    pub fn mark_vow_completed(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE vows SET completed = 1, completed_at = ?2 WHERE id = ?1 AND completed = 0",
            params![id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    // === Claims ===

    pub fn insert_claim(
        &self,
        date: NaiveDate,
        vow_id: i64,
        reflection_items: &BTreeMap<String, bool>,
        ritual_completed: bool,
        created_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO claims (date, vow_id, reflection_items, ritual_completed, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                date.to_string(),
                vow_id,
                serde_json::to_string(reflection_items).unwrap_or_else(|_| "{}".into()),
                ritual_completed,
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn claim_for_date(&self, date: NaiveDate) -> Result<Option<Claim>, DatabaseError> {
        let claim = self
            .conn
            .query_row(
                &format!("SELECT {CLAIM_COLS} FROM claims WHERE date = ?1"),
                params![date.to_string()],
                row_to_claim,
            )
            .optional()?;
        Ok(claim)
    }

    pub fn mark_claim_completed(
        &self,
        id: i64,
        evidence_ref: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE claims SET completed = 1, completed_at = ?2, evidence_ref = ?3
             WHERE id = ?1 AND completed = 0",
            params![id, at.to_rfc3339(), evidence_ref],
        )?;
        Ok(())
    }

    pub fn update_reflection_items(
        &self,
        id: i64,
        reflection_items: &BTreeMap<String, bool>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE claims SET reflection_items = ?2 WHERE id = ?1",
            params![
                id,
                serde_json::to_string(reflection_items).unwrap_or_else(|_| "{}".into()),
            ],
        )?;
        Ok(())
    }

    // === Breaches ===

    pub fn insert_breach(
        &self,
        date: NaiveDate,
        kind: BreachKind,
        reason: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO breaches (date, kind, reason, repaired, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                date.to_string(),
                kind.as_str(),
                reason,
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn breach_by_id(&self, id: i64) -> Result<Option<Breach>, DatabaseError> {
        let breach = self
            .conn
            .query_row(
                &format!("SELECT {BREACH_COLS} FROM breaches WHERE id = ?1"),
                params![id],
                row_to_breach,
            )
            .optional()?;
        Ok(breach)
    }

    pub fn breaches_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Breach>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BREACH_COLS} FROM breaches
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![start.to_string(), end.to_string()], row_to_breach)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_unrepaired(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, DatabaseError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM breaches WHERE date >= ?1 AND date <= ?2 AND repaired = 0",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_repaired(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, DatabaseError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM breaches WHERE date >= ?1 AND date <= ?2 AND repaired = 1",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn debt_days(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, DatabaseError> {
        let count = self.conn.query_row(
            "SELECT COUNT(DISTINCT date) FROM breaches
             WHERE date >= ?1 AND date <= ?2 AND repaired = 0",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn mark_breach_repaired(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE breaches SET repaired = 1, repaired_at = ?2 WHERE id = ?1 AND repaired = 0",
            params![id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    // === Streak state (singleton row) ===

    pub fn streak_state(&self) -> Result<Option<StreakState>, DatabaseError> {
        let state = self
            .conn
            .query_row(
                "SELECT current_streak, longest_streak, last_success_date, extender_passes, updated_at
                 FROM streak_state WHERE id = 1",
                [],
                |row| {
                    Ok(StreakState {
                        current_streak: row.get(0)?,
                        longest_streak: row.get(1)?,
                        last_success_date: row
                            .get::<_, Option<String>>(2)?
                            .map(|s| parse_date(2, &s))
                            .transpose()?,
                        extender_passes: row.get(3)?,
                        updated_at: parse_ts(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    pub fn upsert_streak_state(&self, state: &StreakState) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO streak_state
             (id, current_streak, longest_streak, last_success_date, extender_passes, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                state.current_streak,
                state.longest_streak,
                state.last_success_date.map(|d| d.to_string()),
                state.extender_passes,
                state.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // === Integrity scores (append-only) ===

    pub fn insert_score(&self, score: &IntegrityScore) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO integrity_scores
             (period_start, period_end, score, breach_count, repair_count, streak_days, debt_days, calculated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                score.period_start.to_string(),
                score.period_end.to_string(),
                score.score,
                score.breach_count,
                score.repair_count,
                score.streak_days,
                score.debt_days,
                score.calculated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn recent_scores(&self, limit: u32) -> Result<Vec<IntegrityScore>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCORE_COLS} FROM integrity_scores
             ORDER BY period_start DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], row_to_score)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // === Challenges ===

    pub fn insert_challenge(
        &self,
        start_date: NaiveDate,
        items: &[String],
        created_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO challenges (start_date, items, active, completed_days, created_at)
             VALUES (?1, ?2, 1, 0, ?3)",
            params![
                start_date.to_string(),
                serde_json::to_string(items).unwrap_or_else(|_| "[]".into()),
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn active_challenge(&self) -> Result<Option<Challenge>, DatabaseError> {
        let challenge = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CHALLENGE_COLS} FROM challenges
                     WHERE active = 1 ORDER BY start_date DESC, id DESC LIMIT 1"
                ),
                [],
                row_to_challenge,
            )
            .optional()?;
        Ok(challenge)
    }

    pub fn set_challenge_progress(
        &self,
        id: i64,
        completed_days: u32,
        active: bool,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE challenges SET completed_days = ?2, active = ?3 WHERE id = ?1",
            params![id, completed_days, active],
        )?;
        Ok(())
    }

    pub fn deactivate_challenges(&self) -> Result<usize, DatabaseError> {
        let changed = self
            .conn
            .execute("UPDATE challenges SET active = 0 WHERE active = 1", [])?;
        Ok(changed)
    }

    // === Audit outcome log ===

    pub fn audit_outcome_for(&self, date: NaiveDate) -> Result<Option<String>, DatabaseError> {
        let outcome = self
            .conn
            .query_row(
                "SELECT outcome FROM audit_log WHERE date = ?1",
                params![date.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(outcome)
    }

    pub fn record_audit_outcome(
        &self,
        date: NaiveDate,
        outcome: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO audit_log (date, outcome, recorded_at) VALUES (?1, ?2, ?3)",
            params![date.to_string(), outcome, at.to_rfc3339()],
        )?;
        Ok(())
    }
}
