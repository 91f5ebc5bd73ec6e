//! Core error types for vowkeep-core.
//!
//! This module defines the error hierarchy using thiserror. The taxonomy
//! matters for callers: validation and not-found errors are rejected actions,
//! transient verification errors mean "retry later", and database errors
//! never leave partial state behind (mutations run inside transactions).

use std::path::PathBuf;
use thiserror::Error;

use chrono::NaiveDate;

/// Core error type for vowkeep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Verification errors (audit evidence checks)
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors: the caller passed input the ledger refuses to record.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A vow needs at least one item
    #[error("A vow must name at least one item")]
    EmptyVow,

    /// One vow per calendar day
    #[error("A vow for {date} already exists")]
    VowExists { date: NaiveDate },

    /// One claim per calendar day
    #[error("A claim for {date} already exists")]
    ClaimExists { date: NaiveDate },

    /// A challenge needs at least one item
    #[error("A challenge must name at least one item")]
    EmptyChallenge,

    /// Score periods are inclusive and must span at least one day
    #[error("Invalid date range: {start}..={end} spans no days")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Strict-mode claim completion with unfinished reflection items
    #[error("Reflection incomplete, unconfirmed items: {}", missing.join(", "))]
    ReflectionIncomplete { missing: Vec<String> },
}

/// The operation referenced an entity that does not exist.
#[derive(Error, Debug)]
pub enum NotFoundError {
    /// No vow row with this id
    #[error("No vow with id {id}")]
    Vow { id: i64 },

    /// No claim recorded for the date
    #[error("No claim recorded for {date}")]
    Claim { date: NaiveDate },

    /// No active challenge
    #[error("No active challenge")]
    Challenge,
}

/// Errors from a [`VerificationProvider`](crate::verify::VerificationProvider).
///
/// `Transient` is the correctness-critical case: the audit must treat it as
/// "inconclusive, retry later" and never convert it into a breach.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The check could not be completed (timeout, 5xx, transport failure)
    #[error("verification inconclusive: {0}")]
    Transient(String),

    /// The verifier is missing credentials or settings
    #[error("verifier not configured: {0}")]
    NotConfigured(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
