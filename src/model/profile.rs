//! Profiles: a config merged with the checker's summary of the same person.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    Experience, Info, Language, Outcome, ProfileConfig, ProjectInfo, School, Skill, Summary,
    is_ready,
};

/// Reasons a config and a summary cannot be merged.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("summary of {username:?} carries an error: {error}")]
    FailedSummary { username: String, error: String },

    #[error("summary of {0:?} contains no info")]
    MissingInfo(String),

    #[error("usernames do not match: config {config:?}, summary {summary:?}")]
    UsernameMismatch { config: String, summary: String },

    #[error("got {configs} configs but {summaries} summaries")]
    CountMismatch { configs: usize, summaries: usize },
}

/// A project shown on a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub name: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub description: Option<String>,
    pub priority: i64,
    pub readme_image_urls: Vec<String>,
    pub demo_url: Option<String>,
    /// Path of the downloaded image, relative to the output directory.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl Project {
    /// Projects without a priority are not shown.
    fn from_info(project: ProjectInfo) -> Option<Self> {
        Some(Self {
            priority: project.priority?,
            name: project.name,
            title: project.title,
            source_url: project.source_url,
            description: project.description,
            readme_image_urls: project.readme_image_urls,
            demo_url: project.demo_url,
            thumbnail_url: None,
        })
    }

    /// Image candidates in the order they should be tried.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.readme_image_urls
            .iter()
            .map(String::as_str)
            .chain(self.demo_url.as_deref())
    }
}

/// A published profile. Always derived, never hand-authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    pub bio: Option<String>,
    pub looking_for: Option<String>,
    pub email: Option<String>,
    pub avatar_url: String,
    pub location: Option<String>,
    pub discord_id: Option<u64>,
    pub github_username: String,
    pub github_url: String,
    pub linkedin_url: Option<String>,
    pub skills: BTreeSet<Skill>,
    pub domains: Vec<String>,
    pub experience: BTreeSet<Experience>,
    pub secondary_school: Option<School>,
    pub university: Option<School>,
    pub languages: Vec<Language>,
    /// Warnings and errors found by the checker, in the checker's order.
    pub issues: Vec<Outcome>,
    /// Projects with a priority, lowest priority first.
    pub projects: Vec<Project>,
    pub is_ready: bool,
    /// Link to the report issue, filled in by `report`.
    #[serde(default)]
    pub report_url: Option<String>,
}

impl Profile {
    /// Merges a config with the summary of the same username.
    ///
    /// Personal fields prefer the document, then the checker, then (for
    /// `name` only) the username.
    pub fn create(config: ProfileConfig, summary: Summary) -> Result<Self, MergeError> {
        if let Some(error) = summary.error {
            return Err(MergeError::FailedSummary {
                username: summary.username,
                error,
            });
        }
        if config.username != summary.username {
            return Err(MergeError::UsernameMismatch {
                config: config.username,
                summary: summary.username,
            });
        }
        let Some(info) = summary.info else {
            return Err(MergeError::MissingInfo(summary.username));
        };
        let Info {
            name,
            bio,
            email,
            avatar_url,
            linkedin_url,
            location,
            projects,
        } = info;

        let is_ready = is_ready(&summary.outcomes);
        let issues = summary
            .outcomes
            .into_iter()
            .filter(|o| o.status.is_issue())
            .collect();

        let mut projects: Vec<Project> = projects.into_iter().filter_map(Project::from_info).collect();
        // Stable: equal priorities keep the checker's order.
        projects.sort_by_key(|p| p.priority);

        Ok(Self {
            name: prefer(config.name, name).unwrap_or_else(|| config.username.clone()),
            bio: prefer(config.bio, bio),
            looking_for: config.looking_for,
            email: prefer(config.email, email),
            avatar_url,
            location: prefer(config.location, location),
            discord_id: config.discord_id,
            github_username: config.username,
            github_url: config.github_url,
            linkedin_url,
            skills: config.skills,
            domains: config.domains,
            experience: config.experience,
            secondary_school: config.secondary_school,
            university: config.university,
            languages: config.languages,
            issues,
            projects,
            is_ready,
            report_url: None,
        })
    }
}

/// The first non-empty value.
fn prefer(document: Option<String>, checker: Option<String>) -> Option<String> {
    document
        .filter(|s| !s.is_empty())
        .or(checker.filter(|s| !s.is_empty()))
}

/// Pairs configs with summaries by username and merges each pair.
///
/// Both sides are sorted by username and zipped, so they must hold the same
/// set of usernames. Any difference is an error, never a silent drop.
pub fn create_profiles(
    mut configs: Vec<ProfileConfig>,
    mut summaries: Vec<Summary>,
) -> Result<Vec<Profile>, MergeError> {
    if configs.len() != summaries.len() {
        return Err(MergeError::CountMismatch {
            configs: configs.len(),
            summaries: summaries.len(),
        });
    }
    configs.sort_by(|a, b| a.username.cmp(&b.username));
    summaries.sort_by(|a, b| a.username.cmp(&b.username));

    configs
        .into_iter()
        .zip(summaries)
        .map(|(config, summary)| Profile::create(config, summary))
        .collect()
}
