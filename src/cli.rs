//! CLI interface for eggtray.
//!
//! Three commands, each meant to run unattended (typically in GitHub Actions):
//!
//! - `eggtray build`: profile configs in, `profiles.json` out.
//! - `eggtray check`: answer a check request filed as a GitHub issue.
//! - `eggtray report`: keep report issues in sync with profile readiness.
//!
//! Defaults come from the settings file (see [`Settings`]); flags override it.

mod build;
mod check;
mod report;

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::AuthArgs;
use crate::checker::DEFAULT_CHECKER_TIMEOUT;
use crate::github::{DEFAULT_API_URL, DEFAULT_REPO, GitHubClient, Repo};
use crate::settings::Settings;

use build::BuildArgs;
use check::CheckArgs;
use report::ReportArgs;

/// Eggtray: profiles of junior candidates, checked and listed.
#[derive(Debug, Parser)]
#[command(name = "eggtray", version)]
pub struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the listing of profiles.
    ///
    /// Reads `<username>.yml` profile configs, has every GitHub profile
    /// checked, and writes the merged profiles to `<output_dir>/profiles.json`.
    Build(BuildArgs),

    /// Check the GitHub profile requested in an issue.
    ///
    /// The issue number comes from the argument or from the GitHub event
    /// payload. Posts the feedback as a comment and closes the issue.
    Check(CheckArgs),

    /// Open, update, or close report issues for profiles that aren't ready.
    ///
    /// Writes the report issue URLs back into the listing.
    Report(ReportArgs),
}

/// Repository and credentials for commands talking to GitHub.
#[derive(Debug, clap::Args)]
pub struct GitHubArgs {
    /// GitHub repository, as owner/repo. Defaults to `juniorguru/eggtray`.
    #[arg(long)]
    repo: Option<String>,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    #[command(flatten)]
    auth: AuthArgs,
}

/// An authenticated connection to one repository.
pub struct GitHub {
    pub repo: Repo,
    pub client: GitHubClient,
    pub token: String,
}

impl GitHubArgs {
    async fn connect(self, settings: &Settings) -> Result<GitHub, String> {
        let repo: Repo = self
            .repo
            .or_else(|| settings.repo.clone())
            .as_deref()
            .unwrap_or(DEFAULT_REPO)
            .parse()?;
        debug!("GitHub repository: {repo}");

        let api_url = self
            .github_api_url
            .or_else(|| settings.github_api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let auth = self.auth.resolve().map_err(|e| e.to_string())?;
        let token = auth
            .token(&api_url)
            .await
            .map_err(|e| format!("failed to authenticate with GitHub: {e}"))?;

        let client = GitHubClient::new(api_url, repo.clone(), Some(token.clone()))
            .map_err(|e| format!("failed to set up GitHub client: {e}"))?;
        Ok(GitHub {
            repo,
            client,
            token,
        })
    }
}

/// Checker timeout: the flag, else the setting, else the default.
fn checker_timeout(secs: Option<u64>, settings: &Settings) -> Duration {
    secs.or(settings.checker_timeout)
        .map_or(DEFAULT_CHECKER_TIMEOUT, Duration::from_secs)
}

/// Link to the current workflow run, when running inside one.
fn run_url(repo: &Repo, run_id: Option<u64>) -> Option<String> {
    let url = repo.run_url(run_id?);
    info!("Working inside {url}");
    Some(url)
}

#[derive(Deserialize)]
struct EventPayload {
    action: Option<String>,
    issue: EventIssue,
}

#[derive(Deserialize)]
struct EventIssue {
    number: u64,
}

/// The issue to work on: given explicitly, or read from the event payload.
fn issue_number(number: Option<u64>, event_path: Option<&Path>) -> Result<u64, String> {
    if let Some(number) = number {
        return Ok(number);
    }
    let path = event_path.ok_or("issue number or event payload path is required")?;
    info!("Event payload path: {}", path.display());

    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let payload: EventPayload = serde_json::from_str(&json)
        .map_err(|e| format!("invalid event payload at {}: {e}", path.display()))?;
    if let Some(action) = &payload.action {
        info!("Event action: {action}");
    }
    Ok(payload.issue.number)
}

/// Run the CLI, returning an error message on failure.
pub async fn run(cli: Cli) -> Result<(), String> {
    let settings = Settings::load()?;
    if let Some(path) = Settings::path() {
        debug!("Settings: {}", path.display());
    }

    match cli.command {
        Command::Build(args) => build::cmd_build(args, &settings).await,
        Command::Check(args) => check::cmd_check(args, &settings).await,
        Command::Report(args) => report::cmd_report(args, &settings).await,
    }
}
