use clap::Subcommand;
use vowkeep_core::claim::ClaimTracker;
use vowkeep_core::clock::{Clock, SystemClock};
use vowkeep_core::storage::{Config, LedgerDb};
use vowkeep_core::verify::LocalEvidenceVerifier;

#[derive(Subcommand)]
pub enum ClaimAction {
    /// Open today's claim against today's vow
    New {
        /// Reflection keys to confirm immediately (repeatable)
        #[arg(long = "confirm")]
        confirm: Vec<String>,
        /// Mark the parallel daily ritual done
        #[arg(long)]
        ritual: bool,
    },
    /// Confirm one reflection checklist entry
    Confirm {
        /// Checklist key, e.g. kept_vow
        key: String,
    },
    /// Complete today's claim and write the local evidence note
    Complete {
        /// External evidence reference (commit sha)
        #[arg(long)]
        evidence: Option<String>,
    },
    /// Print today's claim as JSON
    Show,
}

pub fn run(action: ClaimAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let config = Config::load_or_default();
    let tracker = if config.audit.strict_claims {
        ClaimTracker::strict(&db, &clock, &config.reflection)
    } else {
        ClaimTracker::new(&db, &clock, &config.reflection)
    };

    match action {
        ClaimAction::New { confirm, ritual } => {
            let vow = db
                .vow_for_date(clock.today())?
                .ok_or("no vow recorded for today; run `vow new` first")?;
            let items = confirm.into_iter().map(|k| (k, true)).collect();
            let id = tracker.create_claim(vow.id, items, ritual)?;
            eprintln!("Claim opened: {id}");
        }
        ClaimAction::Confirm { key } => {
            tracker.set_reflection_item(&key, true)?;
            eprintln!("Confirmed: {key}");
        }
        ClaimAction::Complete { evidence } => {
            let claim = tracker
                .claim_for_today()?
                .ok_or("no claim opened for today; run `claim new` first")?;
            tracker.complete_claim(claim.id, evidence.as_deref())?;

            let note = match &evidence {
                Some(sha) => format!("claim complete, commit {sha}"),
                None => "claim complete".to_string(),
            };
            let local = LocalEvidenceVerifier::default_location()?;
            let path = local.write_evidence(clock.today(), &note)?;
            eprintln!("Claim completed, evidence note at {}", path.display());
        }
        ClaimAction::Show => {
            let claim = tracker.claim_for_today()?;
            println!("{}", serde_json::to_string_pretty(&claim)?);
        }
    }
    Ok(())
}
