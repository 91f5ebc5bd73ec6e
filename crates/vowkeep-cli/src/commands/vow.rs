use clap::Subcommand;
use vowkeep_core::clock::SystemClock;
use vowkeep_core::storage::LedgerDb;
use vowkeep_core::vow::VowTracker;

#[derive(Subcommand)]
pub enum VowAction {
    /// Declare today's vow
    New {
        /// Commitment items, one per argument
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Mark today's vow completed
    Complete,
    /// Print today's vow as JSON
    Show,
}

pub fn run(action: VowAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let clock = SystemClock;
    let tracker = VowTracker::new(&db, &clock);

    match action {
        VowAction::New { items } => {
            let id = tracker.create_vow(&items)?;
            eprintln!("Vow recorded: {id}");
        }
        VowAction::Complete => {
            if tracker.complete_vow()? {
                eprintln!("Vow completed");
            } else {
                eprintln!("No vow recorded for today");
            }
        }
        VowAction::Show => {
            let vow = tracker.vow_for_today()?;
            println!("{}", serde_json::to_string_pretty(&vow)?);
        }
    }
    Ok(())
}
