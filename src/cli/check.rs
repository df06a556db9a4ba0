//! `eggtray check`.

use std::path::PathBuf;

use tracing::info;

use crate::check::{CheckOptions, CheckOutcome, DEFAULT_CHECK_LABEL, check_profile};
use crate::checker::{CheckerOptions, ServiceChecker};
use crate::github::IssueState;
use crate::messages::Locale;
use crate::settings::Settings;

use super::{GitHubArgs, checker_timeout, issue_number, run_url};

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Issue to process. Read from the event payload when omitted.
    pub(super) issue_number: Option<u64>,

    #[command(flatten)]
    pub(super) github: GitHubArgs,

    /// Issue states to process. Useful for debugging on closed issues.
    #[arg(short, long = "state", value_enum, default_values_t = [IssueState::Open])]
    pub(super) states: Vec<IssueState>,

    /// Label marking check requests. Defaults to `check`.
    #[arg(long)]
    pub(super) label: Option<String>,

    #[arg(long, value_enum)]
    pub(super) locale: Option<Locale>,

    /// Replace the "please wait" comment with the result.
    #[arg(long)]
    pub(super) in_place: bool,

    /// Endpoint of the profile checking service.
    #[arg(long, env = "EGGTRAY_CHECKER_URL")]
    pub(super) checker_url: Option<String>,

    /// Seconds to wait for the profile checker per profile. Defaults to 600.
    #[arg(long, value_name = "SECS")]
    pub(super) checker_timeout: Option<u64>,

    /// Location of GitHub's event payload. Relevant only inside GitHub Actions.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub(super) github_event: Option<PathBuf>,

    /// GitHub run ID. Relevant only inside GitHub Actions.
    #[arg(long, env = "GITHUB_RUN_ID")]
    pub(super) github_run_id: Option<u64>,
}

pub(super) async fn cmd_check(args: CheckArgs, settings: &Settings) -> Result<(), String> {
    let number = issue_number(args.issue_number, args.github_event.as_deref())?;
    info!("Processing issue #{number}");

    let checker_url = args
        .checker_url
        .or_else(|| settings.checker_url.clone())
        .ok_or("no profile checker configured: use --checker-url or EGGTRAY_CHECKER_URL")?;

    let github = args.github.connect(settings).await?;
    let checker = ServiceChecker::new(
        checker_url,
        CheckerOptions {
            github_api_key: Some(github.token.clone()),
            timeout: checker_timeout(args.checker_timeout, settings),
            ..CheckerOptions::default()
        },
    )
    .map_err(|e| format!("failed to set up profile checker: {e}"))?;

    let options = CheckOptions {
        states: args.states,
        label: args
            .label
            .or_else(|| settings.check_label.clone())
            .unwrap_or_else(|| DEFAULT_CHECK_LABEL.to_string()),
        locale: args.locale.or(settings.locale).unwrap_or_default(),
        run_url: run_url(&github.repo, args.github_run_id),
        in_place: args.in_place,
    };

    let outcome = check_profile(&github.client, &checker, number, &options)
        .await
        .map_err(|e| format!("checking issue #{number} failed: {e}"))?;

    match outcome {
        CheckOutcome::Ignored => info!("Issue #{number} left untouched"),
        CheckOutcome::Missing { username } => info!("Profile @{username} doesn't exist"),
        CheckOutcome::Checked { username, summary } => {
            info!("Checked @{username}, ready: {}", summary.is_ready());
        }
    }
    Ok(())
}
