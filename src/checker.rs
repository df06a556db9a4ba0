//! The profile checker: analyzes a GitHub profile and returns a summary.
//!
//! The analysis itself lives in an external service. This module only
//! defines the seam ([`ProfileChecker`]) and an HTTP client for the service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::model::Summary;

/// Large profiles take minutes to analyze.
pub const DEFAULT_CHECKER_TIMEOUT: Duration = Duration::from_secs(600);

/// Header carrying the GitHub token the service should use on our behalf.
const GITHUB_API_KEY_HEADER: &str = "x-github-api-key";

/// Errors from talking to the checker.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("request to the profile checker failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("profile checker responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("checking {username:?} failed: {error}")]
    Failed { username: String, error: String },
}

/// Something that turns a GitHub profile URL into a [`Summary`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileChecker: Send + Sync {
    /// Checks the profile at `url`.
    ///
    /// A summary with `error` set is still `Ok` unless the checker was
    /// configured to raise on errors.
    async fn check_profile_url(&self, url: &str) -> Result<Summary, CheckerError>;
}

/// Options for [`ServiceChecker`].
#[derive(Debug, Clone)]
pub struct CheckerOptions {
    /// Token forwarded to the service for GitHub API access.
    pub github_api_key: Option<String>,
    /// Turn summaries carrying an error into [`CheckerError::Failed`].
    pub raise_on_error: bool,
    pub timeout: Duration,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            github_api_key: None,
            raise_on_error: false,
            timeout: DEFAULT_CHECKER_TIMEOUT,
        }
    }
}

/// Checker backed by the profile checking service over HTTP.
///
/// `GET {endpoint}?url={profile_url}` answers with a summary as JSON.
#[derive(Debug, Clone)]
pub struct ServiceChecker {
    client: reqwest::Client,
    endpoint: String,
    options: CheckerOptions,
}

impl ServiceChecker {
    pub fn new(endpoint: impl Into<String>, options: CheckerOptions) -> Result<Self, CheckerError> {
        let version = env!("CARGO_PKG_VERSION");
        let client = reqwest::Client::builder()
            .user_agent(format!("eggtray/{version}"))
            .connect_timeout(Duration::from_secs(10))
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            options,
        })
    }
}

#[async_trait]
impl ProfileChecker for ServiceChecker {
    async fn check_profile_url(&self, url: &str) -> Result<Summary, CheckerError> {
        debug!("Checking {url} via {}", self.endpoint);
        let mut request = self.client.get(&self.endpoint).query(&[("url", url)]);
        if let Some(key) = &self.options.github_api_key {
            request = request.header(GITHUB_API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckerError::Status { status, body });
        }

        let summary: Summary = response.json().await?;
        if self.options.raise_on_error
            && let Some(error) = &summary.error
        {
            return Err(CheckerError::Failed {
                username: summary.username.clone(),
                error: error.clone(),
            });
        }
        Ok(summary)
    }
}
