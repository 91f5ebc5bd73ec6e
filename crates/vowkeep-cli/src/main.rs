use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vowkeep-cli", version, about = "Vowkeep CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Morning vow management
    Vow {
        #[command(subcommand)]
        action: commands::vow::VowAction,
    },
    /// Evening claim management
    Claim {
        #[command(subcommand)]
        action: commands::claim::ClaimAction,
    },
    /// Breach recording and repair
    Breach {
        #[command(subcommand)]
        action: commands::breach::BreachAction,
    },
    /// Streak state
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Integrity score
    Score {
        #[command(subcommand)]
        action: commands::score::ScoreAction,
    },
    /// Daily audit
    Audit {
        #[command(subcommand)]
        action: commands::audit::AuditAction,
    },
    /// Multi-day challenge tracking
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Authentication for the GitHub verifier
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Vow { action } => commands::vow::run(action),
        Commands::Claim { action } => commands::claim::run(action),
        Commands::Breach { action } => commands::breach::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Score { action } => commands::score::run(action),
        Commands::Audit { action } => commands::audit::run(action),
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
