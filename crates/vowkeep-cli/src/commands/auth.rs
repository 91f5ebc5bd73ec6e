use clap::Subcommand;
use vowkeep_core::verify::{keyring_store, GithubVerifier};

#[derive(Subcommand)]
pub enum AuthAction {
    /// GitHub: login / logout / status
    Github {
        #[command(subcommand)]
        action: AuthOp,
    },
}

#[derive(Subcommand)]
pub enum AuthOp {
    /// Store a personal access token
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check whether a token is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let AuthAction::Github { action: op } = action;
    match op {
        AuthOp::Login { token } => {
            GithubVerifier::store_token(&token)?;
            eprintln!("GitHub token stored");
        }
        AuthOp::Logout => {
            GithubVerifier::forget_token()?;
            eprintln!("GitHub token removed");
        }
        AuthOp::Status => {
            let stored = keyring_store::get("github_token")?.is_some();
            eprintln!(
                "GitHub: {}",
                if stored { "token stored" } else { "no token" }
            );
        }
    }
    Ok(())
}
