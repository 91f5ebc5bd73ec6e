use chrono::NaiveDate;
use clap::Subcommand;
use vowkeep_core::clock::{Clock, SystemClock};
use vowkeep_core::score::ScoringEngine;
use vowkeep_core::storage::LedgerDb;

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Score an explicit period
    Calc {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Score the last seven days
    Week,
    /// Print score history, latest first
    History {
        #[arg(long, default_value = "12")]
        limit: u32,
    },
}

pub fn run(action: ScoreAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let engine = ScoringEngine::new(&db, &clock);

    match action {
        ScoreAction::Calc { start, end } => {
            let score = engine.calculate_score(start, end)?;
            println!("{}", serde_json::to_string_pretty(&score)?);
        }
        ScoreAction::Week => {
            let end = clock.today();
            let start = end - chrono::Duration::days(6);
            let score = engine.calculate_score(start, end)?;
            println!("{}", serde_json::to_string_pretty(&score)?);
        }
        ScoreAction::History { limit } => {
            let scores = engine.recent_scores(limit)?;
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
    }
    Ok(())
}
