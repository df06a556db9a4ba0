//! `eggtray report`.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::messages::Locale;
use crate::report::{DEFAULT_REPORT_LABEL, ReportOptions, backfill_report_urls, report_profiles};
use crate::settings::Settings;
use crate::storage::{read_listing, write_listing};

use super::{GitHubArgs, run_url};

#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    /// The listing written by `eggtray build`.
    #[arg(default_value = "output/profiles.json")]
    pub(super) data_path: PathBuf,

    #[command(flatten)]
    pub(super) github: GitHubArgs,

    /// Label of report issues. Defaults to `profile not ready`.
    #[arg(long)]
    pub(super) label: Option<String>,

    #[arg(long, value_enum)]
    pub(super) locale: Option<Locale>,

    /// GitHub run ID. Relevant only inside GitHub Actions.
    #[arg(long, env = "GITHUB_RUN_ID")]
    pub(super) github_run_id: Option<u64>,
}

pub(super) async fn cmd_report(args: ReportArgs, settings: &Settings) -> Result<(), String> {
    debug!("Data path: {}", args.data_path.display());
    let mut listing = read_listing(&args.data_path)
        .map_err(|e| format!("failed to read {}: {e}", args.data_path.display()))?;
    debug!("Profiles loaded: {}", listing.items.len());

    let github = args.github.connect(settings).await?;
    let options = ReportOptions {
        label: args
            .label
            .or_else(|| settings.report_label.clone())
            .unwrap_or_else(|| DEFAULT_REPORT_LABEL.to_string()),
        locale: args.locale.or(settings.locale).unwrap_or_default(),
        run_url: run_url(&github.repo, args.github_run_id),
    };

    let issues = report_profiles(&github.client, &listing.items, &options)
        .await
        .map_err(|e| format!("reporting failed: {e}"))?;
    debug!(
        "Updates: {:?}",
        issues
            .iter()
            .map(|(username, issue)| (username, &issue.html_url))
            .collect::<Vec<_>>()
    );

    backfill_report_urls(&mut listing.items, &issues);
    info!("Saving updated profiles to {}", args.data_path.display());
    write_listing(&args.data_path, &listing)
        .map_err(|e| format!("failed to write {}: {e}", args.data_path.display()))
}
