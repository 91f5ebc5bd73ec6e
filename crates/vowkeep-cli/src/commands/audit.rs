use chrono::NaiveDate;
use clap::Subcommand;
use vowkeep_core::audit::DailyAudit;
use vowkeep_core::clock::SystemClock;
use vowkeep_core::error::{CoreError, VerificationError};
use vowkeep_core::notify::ConsoleNotifier;
use vowkeep_core::storage::{Config, LedgerDb};
use vowkeep_core::verify::{
    ChainVerifier, GithubVerifier, LocalEvidenceVerifier, VerificationProvider,
};

#[derive(Subcommand)]
pub enum AuditAction {
    /// Audit yesterday's claim against external evidence
    Run {
        /// Audit a specific date instead of yesterday (catch-up)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Skip GitHub and check only local evidence notes
        #[arg(long)]
        local_only: bool,
    },
}

pub fn run(action: AuditAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;

    let AuditAction::Run { date, local_only } = action;

    let local = LocalEvidenceVerifier::default_location()?;
    let github = if local_only {
        None
    } else {
        match GithubVerifier::from_config(&config.github) {
            Ok(verifier) => Some(verifier),
            Err(VerificationError::NotConfigured(reason)) => {
                eprintln!("GitHub verification disabled: {reason}");
                None
            }
            Err(e) => return Err(e.into()),
        }
    };

    // Local evidence backs up the remote check, but only when the remote
    // check is inconclusive -- a definite "no commit" stands.
    let chain;
    let verifier: &dyn VerificationProvider = match &github {
        Some(github) => {
            chain = ChainVerifier::new(github, &local);
            &chain
        }
        None => &local,
    };

    let audit = DailyAudit::new(&db, &clock, verifier).with_notifier(&notifier);
    let outcome = match date {
        Some(date) => audit.run_for(date),
        None => audit.run(),
    };

    match outcome {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(CoreError::Verification(VerificationError::Transient(reason))) => {
            Err(format!("audit inconclusive, retry later: {reason}").into())
        }
        Err(e) => Err(e.into()),
    }
}
