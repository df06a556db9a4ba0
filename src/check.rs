//! On-demand check of a single GitHub profile, requested through an issue.
//!
//! ```text
//! fetched → gate checked → username resolved → existence checked
//!         → { checked | missing } → closed
//! ```
//!
//! Gate rejections and an unresolvable username end the workflow without
//! touching the issue. Otherwise the issue ends up commented on and closed.
//! Steps run strictly in sequence since each depends on the previous one.

use tracing::{debug, error, info, warn};

use crate::checker::{CheckerError, ProfileChecker};
use crate::github::{
    GitHubError, Issue, IssueState, IssueTracker, IssueUpdate, username_mention,
};
use crate::messages::{self, Locale};
use crate::model::{Summary, github_url};

pub const DEFAULT_CHECK_LABEL: &str = "check";

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error("failed to render summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Issue states worth processing.
    pub states: Vec<IssueState>,
    /// Label marking an issue as a check request.
    pub label: String,
    pub locale: Locale,
    /// Link to the workflow run doing the check.
    pub run_url: Option<String>,
    /// Replace the wait comment with the result instead of adding another.
    pub in_place: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            states: vec![IssueState::Open],
            label: DEFAULT_CHECK_LABEL.to_string(),
            locale: Locale::default(),
            run_url: None,
            in_place: false,
        }
    }
}

/// How a check request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The issue wasn't a check request we could act on. Nothing changed.
    Ignored,
    /// The requested profile doesn't exist.
    Missing { username: String },
    /// The profile was checked and the result posted.
    Checked { username: String, summary: Summary },
}

/// The username an issue asks about: the first mention in its body,
/// falling back to its author.
pub fn requested_username(issue: &Issue) -> Option<&str> {
    issue
        .body
        .as_deref()
        .and_then(username_mention)
        .or_else(|| issue.user.as_ref().map(|user| user.login.as_str()))
}

/// Processes the check request in issue `number`.
pub async fn check_profile<T, C>(
    tracker: &T,
    checker: &C,
    number: u64,
    options: &CheckOptions,
) -> Result<CheckOutcome, CheckError>
where
    T: IssueTracker + ?Sized,
    C: ProfileChecker + ?Sized,
{
    info!("Fetching issue #{number}");
    let issue = tracker.get_issue(number).await?;

    if !options.states.contains(&issue.state) {
        let allowed: Vec<_> = options.states.iter().map(|s| s.as_str()).collect();
        warn!(
            "Issue #{number} is {}, allowed states: {}",
            issue.state,
            allowed.join(",")
        );
        return Ok(CheckOutcome::Ignored);
    }
    if !issue.has_label(&options.label) {
        warn!("Issue #{number} is missing the {:?} label", options.label);
        return Ok(CheckOutcome::Ignored);
    }

    let Some(username) = requested_username(&issue) else {
        warn!("Issue #{number} doesn't mention a username and has no author");
        return Ok(CheckOutcome::Ignored);
    };
    let username = username.to_string();
    info!("Issue #{number} is about @{username}");

    let locale = options.locale;
    let run_url = options.run_url.as_deref();
    let profile_url = github_url(&username);

    let outcome = if tracker.user_exists(&username).await? {
        info!("Checking profile {profile_url}");
        let title = messages::check_title(locale, &username);
        if issue.title == title {
            debug!("Title of issue #{number} is up to date");
        } else {
            debug!("Updating title of issue #{number} to {title:?}");
            let update = IssueUpdate {
                title: Some(title),
                ..IssueUpdate::default()
            };
            tracker.update_issue(number, &update).await?;
        }

        let wait = messages::wait_comment(locale, &username, run_url);
        let wait_id = tracker.create_comment(number, &wait).await?;

        let summary = checker.check_profile_url(&profile_url).await?;
        debug!("Summary: {summary:?}");
        let body = messages::summary_comment(locale, &summary, run_url)?;
        info!("Posting summary");
        if options.in_place {
            tracker.update_comment(wait_id, &body).await?;
        } else {
            tracker.create_comment(number, &body).await?;
        }
        CheckOutcome::Checked { username, summary }
    } else {
        error!("Profile {profile_url} doesn't exist");
        let body = messages::missing_profile_comment(locale, &username, run_url);
        tracker.create_comment(number, &body).await?;
        CheckOutcome::Missing { username }
    };

    if issue.state == IssueState::Closed {
        debug!("Issue #{number} is already closed");
    } else {
        info!("Closing issue #{number}");
        tracker.update_issue(number, &IssueUpdate::close()).await?;
    }
    Ok(outcome)
}
