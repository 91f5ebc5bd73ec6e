//! Local evidence files.
//!
//! Completing a claim writes a dated audit note under `logs/`; the file's
//! existence doubles as the offline verification fallback. This is the
//! fallback arm of a [`ChainVerifier`](super::ChainVerifier) -- it is only
//! consulted when the remote check was inconclusive.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::VerificationError;
use crate::verify::VerificationProvider;

/// Verifies against dated evidence files on the local filesystem.
pub struct LocalEvidenceVerifier {
    logs_dir: PathBuf,
}

impl LocalEvidenceVerifier {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    /// Verifier over `<data_dir>/logs/`.
    pub fn default_location() -> std::io::Result<Self> {
        Ok(Self::new(crate::storage::data_dir()?.join("logs")))
    }

    /// Path of the evidence file for `date`.
    pub fn evidence_path(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir.join(format!("audit_{date}.md"))
    }

    /// Write the evidence note for `date`, creating `logs/` as needed.
    /// Overwrites any previous note for the same date.
    pub fn write_evidence(&self, date: NaiveDate, body: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.logs_dir)?;
        let path = self.evidence_path(date);
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "# Daily audit: {date}")?;
        writeln!(file)?;
        writeln!(file, "{body}")?;
        Ok(path)
    }
}

impl VerificationProvider for LocalEvidenceVerifier {
    fn was_verified(&self, date: NaiveDate) -> Result<bool, VerificationError> {
        exists(&self.evidence_path(date))
    }
}

fn exists(path: &Path) -> Result<bool, VerificationError> {
    path.try_exists()
        .map_err(|e| VerificationError::Transient(format!("cannot stat {}: {e}", path.display())))
}
