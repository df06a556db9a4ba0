//! Results of the external profile checker.
//!
//! Consumed, not owned: the shapes mirror what the checker service returns,
//! so unknown keys are tolerated.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Error,
    Warning,
    Info,
    Done,
}

impl Status {
    /// Whether findings of this severity are surfaced as profile issues.
    pub fn is_issue(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

/// One finding about a GitHub profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    pub docs_url: String,
}

/// A project the checker found on the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub readme_image_urls: Vec<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
}

/// Facts the checker gathered about the person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub avatar_url: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
}

/// The checker's verdict on one GitHub account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub username: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

impl Summary {
    /// True iff no outcome has status ERROR.
    pub fn is_ready(&self) -> bool {
        is_ready(&self.outcomes)
    }
}

/// True iff no outcome has status ERROR.
///
/// Warnings, infos, and done items never block readiness.
pub fn is_ready(outcomes: &[Outcome]) -> bool {
    outcomes.iter().all(|o| o.status != Status::Error)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn outcome(status: Status, message: &str) -> Outcome {
        Outcome {
            status,
            message: message.to_string(),
            docs_url: format!("https://docs.example.com/{}", message.replace(' ', "-")),
        }
    }

    pub fn info() -> Info {
        Info {
            name: None,
            bio: None,
            email: None,
            avatar_url: "https://avatars.example.com/1".to_string(),
            linkedin_url: None,
            location: None,
            projects: Vec::new(),
        }
    }

    pub fn summary(username: &str, outcomes: Vec<Outcome>) -> Summary {
        Summary {
            username: username.to_string(),
            error: None,
            info: Some(info()),
            outcomes,
        }
    }

    pub fn failed_summary(username: &str, error: &str) -> Summary {
        Summary {
            username: username.to_string(),
            error: Some(error.to_string()),
            info: None,
            outcomes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::outcome;
    use super::*;

    #[test]
    fn warnings_do_not_block_readiness() {
        let outcomes = [outcome(Status::Warning, "w"), outcome(Status::Done, "d")];
        assert!(is_ready(&outcomes));
    }

    #[test]
    fn errors_block_readiness() {
        let outcomes = [outcome(Status::Error, "e"), outcome(Status::Done, "d")];
        assert!(!is_ready(&outcomes));
    }

    #[test]
    fn no_outcomes_is_ready() {
        assert!(is_ready(&[]));
    }

    #[test]
    fn parses_checker_payload() {
        let summary: Summary = serde_json::from_str(
            r#"{
                "username": "jana",
                "error": null,
                "info": {
                    "name": "Jana",
                    "avatar_url": "https://avatars.example.com/jana",
                    "projects": [{"name": "todo", "priority": 1, "stars": 4}]
                },
                "outcomes": [
                    {"status": "WARNING", "message": "No bio", "docs_url": "https://x/bio", "rule": "bio"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(summary.outcomes[0].status, Status::Warning);
        let info = summary.info.unwrap();
        assert_eq!(info.projects[0].priority, Some(1));
        assert!(info.projects[0].readme_image_urls.is_empty());
    }
}
