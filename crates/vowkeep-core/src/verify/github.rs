//! GitHub-backed verification -- did a commit land for the audited date?
//!
//! Queries the repository commits API for the date's UTC day window. Error
//! mapping is deliberate: transport failures and 5xx are `Transient`
//! (inconclusive, retry later), auth/repo problems are `NotConfigured`, and
//! an empty commit list is a definite `Ok(false)`.

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};

use crate::error::VerificationError;
use crate::storage::GithubConfig;
use crate::verify::{keyring_store, VerificationProvider};

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "vowkeep";
const TOKEN_KEY: &str = "github_token";

/// Commit-evidence verifier against one GitHub repository.
pub struct GithubVerifier {
    token: String,
    owner: String,
    repo: String,
    base_url: String,
    client: Client,
    runtime: tokio::runtime::Runtime,
}

impl GithubVerifier {
    /// Build a verifier from explicit credentials.
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self, VerificationError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VerificationError::Transient(format!("runtime setup failed: {e}")))?;
        Ok(Self {
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            base_url: GITHUB_API.to_string(),
            client: Client::new(),
            runtime,
        })
    }

    /// Build a verifier from config, with the token from the OS keyring.
    pub fn from_config(config: &GithubConfig) -> Result<Self, VerificationError> {
        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(VerificationError::NotConfigured(
                "github.owner and github.repo are not set".into(),
            ));
        }
        let token = keyring_store::get(TOKEN_KEY)
            .map_err(|e| VerificationError::Transient(format!("keyring unavailable: {e}")))?
            .ok_or_else(|| {
                VerificationError::NotConfigured("no GitHub token stored".into())
            })?;
        Self::new(&token, &config.owner, &config.repo)
    }

    /// Point at a different API root (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Store the token used by [`GithubVerifier::from_config`].
    pub fn store_token(token: &str) -> Result<(), Box<dyn std::error::Error>> {
        keyring_store::set(TOKEN_KEY, token)
    }

    /// Remove the stored token.
    pub fn forget_token() -> Result<(), Box<dyn std::error::Error>> {
        keyring_store::delete(TOKEN_KEY)
    }

    fn commits_url(&self, date: NaiveDate) -> String {
        let next = date + chrono::Duration::days(1);
        format!(
            "{}/repos/{}/{}/commits?since={date}T00:00:00Z&until={next}T00:00:00Z&per_page=1",
            self.base_url, self.owner, self.repo
        )
    }
}

impl VerificationProvider for GithubVerifier {
    fn was_verified(&self, date: NaiveDate) -> Result<bool, VerificationError> {
        let url = self.commits_url(date);
        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.v3+json")
            .send();

        let resp = self
            .runtime
            .block_on(request)
            .map_err(|e| VerificationError::Transient(format!("request failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {
                let commits: Vec<serde_json::Value> = self
                    .runtime
                    .block_on(resp.json())
                    .map_err(|e| VerificationError::Transient(format!("bad response: {e}")))?;
                Ok(!commits.is_empty())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(VerificationError::NotConfigured(format!(
                    "GitHub rejected the request: HTTP {}",
                    resp.status()
                )))
            }
            s => Err(VerificationError::Transient(format!(
                "GitHub API error: HTTP {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn verifier(server: &mockito::ServerGuard) -> GithubVerifier {
        GithubVerifier::new("token", "octocat", "daily-log")
            .unwrap()
            .with_base_url(&server.url())
    }

    fn commits_path() -> mockito::Matcher {
        mockito::Matcher::Regex(r"^/repos/octocat/daily-log/commits".to_string())
    }

    #[test]
    fn commit_present_verifies() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", commits_path())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"sha": "abc1234"}]"#)
            .create();

        let verifier = verifier(&server);
        assert!(verifier.was_verified(date("2026-03-02")).unwrap());
        mock.assert();
    }

    #[test]
    fn empty_commit_list_is_definitively_unverified() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", commits_path())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();

        let verifier = verifier(&server);
        assert_eq!(verifier.was_verified(date("2026-03-02")).unwrap(), false);
    }

    #[test]
    fn server_error_is_transient() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", commits_path())
            .with_status(502)
            .create();

        let verifier = verifier(&server);
        assert!(matches!(
            verifier.was_verified(date("2026-03-02")),
            Err(VerificationError::Transient(_))
        ));
    }

    #[test]
    fn auth_failure_is_not_configured() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", commits_path())
            .with_status(401)
            .create();

        let verifier = verifier(&server);
        assert!(matches!(
            verifier.was_verified(date("2026-03-02")),
            Err(VerificationError::NotConfigured(_))
        ));
    }

    #[test]
    fn queries_the_utc_day_window() {
        let verifier = GithubVerifier::new("t", "o", "r").unwrap();
        let url = verifier.commits_url(date("2026-03-02"));
        assert!(url.contains("since=2026-03-02T00:00:00Z"));
        assert!(url.contains("until=2026-03-03T00:00:00Z"));
        assert!(url.contains("per_page=1"));
    }
}
