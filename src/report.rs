//! Reporting sweep: keep one open report issue per profile that isn't ready.
//!
//! | ready | open report issue | action                         |
//! |-------|-------------------|--------------------------------|
//! | yes   | yes               | comment "fixed", close         |
//! | yes   | no                | nothing                        |
//! | no    | yes               | update title/body if changed   |
//! | no    | no                | create one                     |

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::github::{GitHubError, Issue, IssueState, IssueTracker, IssueUpdate, NewIssue, username_mention};
use crate::messages::{self, Locale};
use crate::model::Profile;

pub const DEFAULT_REPORT_LABEL: &str = "profile not ready";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Label identifying report issues.
    pub label: String,
    pub locale: Locale,
    pub run_url: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            label: DEFAULT_REPORT_LABEL.to_string(),
            locale: Locale::default(),
            run_url: None,
        }
    }
}

/// Open report issues by the (lowercased) username in their title.
///
/// Should a username have more than one, the lowest issue number wins.
fn index_by_username(mut issues: Vec<Issue>) -> BTreeMap<String, Issue> {
    issues.sort_by_key(|issue| issue.number);
    let mut index: BTreeMap<String, Issue> = BTreeMap::new();
    for issue in issues {
        let Some(username) = username_mention(&issue.title).map(str::to_lowercase) else {
            warn!("Report issue #{} has no @username in its title", issue.number);
            continue;
        };
        if let Some(kept) = index.get(&username) {
            warn!(
                "Report issue #{} duplicates #{} for @{username}",
                issue.number, kept.number
            );
            continue;
        }
        index.insert(username, issue);
    }
    index
}

/// Reconciles report issues with profile readiness.
///
/// Returns the open report issue of every profile that isn't ready.
pub async fn report_profiles<T>(
    tracker: &T,
    profiles: &[Profile],
    options: &ReportOptions,
) -> Result<BTreeMap<String, Issue>, GitHubError>
where
    T: IssueTracker + ?Sized,
{
    info!("Fetching existing report issues");
    let issues = tracker.list_issues(&options.label, IssueState::Open).await?;
    info!("Found {} reports", issues.len());
    let mut existing = index_by_username(issues);
    debug!("Reports: {:?}", existing.keys().collect::<Vec<_>>());

    let locale = options.locale;
    let run_url = options.run_url.as_deref();
    let mut active = BTreeMap::new();

    for profile in profiles {
        info!("Processing {}", profile.github_url);
        let username = &profile.github_username;
        let issue = existing.remove(&username.to_lowercase());

        if profile.is_ready {
            let Some(issue) = issue else {
                info!("Profile is ready, no action needed");
                continue;
            };
            info!("Profile is ready, closing {}", issue.html_url);
            tracker
                .create_comment(issue.number, messages::fixed_comment(locale))
                .await?;
            tracker
                .update_issue(issue.number, &IssueUpdate::close())
                .await?;
            continue;
        }

        let title = messages::report_title(locale, username);
        let body = messages::report_body(locale, profile, run_url);
        let issue = match issue {
            Some(issue) => {
                // The run link changes every run and alone isn't worth an update.
                let content = messages::report_body(locale, profile, None);
                let current = issue.body.as_deref().map(messages::strip_run_footer);
                let update = IssueUpdate {
                    title: (issue.title != title).then_some(title),
                    body: (current != Some(content.as_str())).then_some(body),
                    state: None,
                };
                if update.is_empty() {
                    info!("Issue {} is up to date", issue.html_url);
                    issue
                } else {
                    info!("Updating issue {}", issue.html_url);
                    tracker.update_issue(issue.number, &update).await?
                }
            }
            None => {
                info!("Creating issue for {}", profile.github_url);
                let new = NewIssue {
                    title,
                    body,
                    labels: if options.label.is_empty() {
                        vec![]
                    } else {
                        vec![options.label.clone()]
                    },
                };
                let issue = tracker.create_issue(&new).await?;
                info!("Issue: {}", issue.html_url);
                issue
            }
        };
        active.insert(username.clone(), issue);
    }
    Ok(active)
}

/// Points each profile's `report_url` at its open report issue, if any.
pub fn backfill_report_urls(profiles: &mut [Profile], issues: &BTreeMap<String, Issue>) {
    for profile in profiles {
        profile.report_url = issues
            .get(&profile.github_username)
            .map(|issue| issue.html_url.clone());
    }
}
