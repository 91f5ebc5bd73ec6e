mod config;
pub mod ledger_db;
pub mod migrations;

pub use config::{
    AuditConfig, Config, GithubConfig, ReflectionConfig, RepairConfig,
};
pub use ledger_db::LedgerDb;

use std::path::PathBuf;

/// Returns `~/.config/vowkeep[-dev]/` based on VOWKEEP_ENV.
///
/// Set VOWKEEP_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VOWKEEP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("vowkeep-dev")
    } else {
        base_dir.join("vowkeep")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
