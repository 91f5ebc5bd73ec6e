use clap::Subcommand;
use vowkeep_core::clock::SystemClock;
use vowkeep_core::storage::LedgerDb;
use vowkeep_core::streak::StreakEngine;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the streak state as JSON
    Show,
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let engine = StreakEngine::new(&db, &clock);

    match action {
        StreakAction::Show => {
            let state = engine.state()?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}
