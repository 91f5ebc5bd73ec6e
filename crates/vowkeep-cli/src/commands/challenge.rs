use clap::Subcommand;
use vowkeep_core::challenge::ChallengeTracker;
use vowkeep_core::clock::SystemClock;
use vowkeep_core::storage::LedgerDb;

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Start a challenge, replacing any active one
    Start {
        /// Daily items in order, one per argument
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Print the active challenge as JSON
    Show,
    /// Mark today's challenge item done
    Tick,
    /// Retire the active challenge without finishing it
    Stop,
}

pub fn run(action: ChallengeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let tracker = ChallengeTracker::new(&db, &clock);

    match action {
        ChallengeAction::Start { items } => {
            let id = tracker.start_challenge(&items)?;
            eprintln!("Challenge started: {id} ({} days)", items.len());
        }
        ChallengeAction::Show => {
            let challenge = tracker.active_challenge()?;
            println!("{}", serde_json::to_string_pretty(&challenge)?);
        }
        ChallengeAction::Tick => {
            let completed = tracker.record_day()?;
            match tracker.active_challenge()? {
                Some(challenge) => eprintln!(
                    "Day {completed} done, next: {}",
                    challenge.current_item().unwrap_or("-")
                ),
                None => eprintln!("Day {completed} done, challenge finished"),
            }
        }
        ChallengeAction::Stop => {
            if tracker.deactivate()? {
                eprintln!("Challenge retired");
            } else {
                eprintln!("No active challenge");
            }
        }
    }
    Ok(())
}
