use chrono::NaiveDate;
use clap::Subcommand;
use vowkeep_core::breach::{BreachKind, BreachLedger};
use vowkeep_core::clock::{Clock, SystemClock};
use vowkeep_core::storage::{Config, LedgerDb};

#[derive(Subcommand)]
pub enum BreachAction {
    /// Record a breach by hand
    Record {
        /// missed-vow | ignored-interruption (audit kinds are recorded by
        /// the audit itself)
        kind: String,
        /// Why this counts as a breach
        reason: String,
        /// Date of the breach (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Repair a breach by id
    Repair { id: i64 },
    /// List breaches in a window ending today
    List {
        /// Window length in days
        #[arg(long, default_value = "30")]
        days: i64,
    },
}

fn parse_manual_kind(s: &str) -> Result<BreachKind, String> {
    match s {
        "missed-vow" => Ok(BreachKind::MissedVow),
        "ignored-interruption" => Ok(BreachKind::IgnoredInterruption),
        "missed-claim" | "audit-mismatch" => {
            Err(format!("'{s}' breaches are recorded by the daily audit"))
        }
        other => Err(format!("unknown breach kind '{other}'")),
    }
}

pub fn run(action: BreachAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let config = Config::load_or_default();
    let ledger = BreachLedger::new(&db, &clock, &config.repair);

    match action {
        BreachAction::Record { kind, reason, date } => {
            let kind = parse_manual_kind(&kind)?;
            let recorded = match date {
                Some(date) => ledger.record_breach_for(kind, &reason, date)?,
                None => ledger.record_breach(kind, &reason)?,
            };
            println!("{}", serde_json::to_string_pretty(&recorded)?);
        }
        BreachAction::Repair { id } => {
            if ledger.repair_breach(id)? {
                eprintln!("Breach {id} repaired");
            } else {
                eprintln!("Nothing to repair: breach {id} is unknown, out of window, or already repaired");
            }
        }
        BreachAction::List { days } => {
            let end = clock.today();
            let start = end - chrono::Duration::days(days.max(0));
            let breaches = ledger.breaches_in_range(start, end)?;
            println!("{}", serde_json::to_string_pretty(&breaches)?);
        }
    }
    Ok(())
}
