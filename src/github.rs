//! GitHub issues: the REST surface the check and report workflows consume.
//!
//! [`IssueTracker`] is the seam. [`GitHubClient`] implements it over the
//! REST API for one repository.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPO: &str = "juniorguru/eggtray";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PER_PAGE: usize = 100;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w\-]+)").expect("valid regex"));

/// The first `@username` mentioned in `text`.
pub fn username_mention(text: &str) -> Option<&str> {
    USERNAME_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Errors from the GitHub API.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("request to GitHub failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub responded with {status}: {message}")]
    Api { status: StatusCode, message: String },
}

pub type Result<T> = core::result::Result<T, GitHubError>;

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
}

impl Repo {
    /// Link to a GitHub Actions run in this repository.
    pub fn run_url(&self, run_id: u64) -> String {
        format!("https://github.com/{self}/actions/runs/{run_id}")
    }
}

impl FromStr for Repo {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected owner/repo, got {s:?}")),
        }
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub html_url: String,
    /// Present when the "issue" is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A partial issue update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
}

impl IssueUpdate {
    pub fn close() -> Self {
        Self {
            state: Some(IssueState::Closed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.state.is_none()
    }
}

/// Issue operations on one repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, number: u64) -> Result<Issue>;

    /// All issues (not pull requests) carrying `label` in the given state.
    async fn list_issues(&self, label: &str, state: IssueState) -> Result<Vec<Issue>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue>;

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue>;

    /// Posts a comment and returns its id.
    async fn create_comment(&self, number: u64, body: &str) -> Result<u64>;

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;

    /// Whether a GitHub account named `username` exists. A 404 is `false`.
    async fn user_exists(&self, username: &str) -> Result<bool>;
}

#[derive(Deserialize)]
struct Comment {
    id: u64,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// REST client for the issues of one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    repo: Repo,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, repo: Repo, token: Option<String>) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let client = reqwest::Client::builder()
            .user_agent(format!("eggtray/{version}"))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let api_url: String = api_url.into();

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.api_url))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn repo_path(&self, rest: &str) -> String {
        format!("/repos/{}/{}{rest}", self.repo.owner, self.repo.name)
    }
}

/// Turns a non-success response into [`GitHubError::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ApiMessage>()
        .await
        .map(|m| m.message)
        .unwrap_or_default();
    Err(GitHubError::Api { status, message })
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_issue(&self, number: u64) -> Result<Issue> {
        debug!("Fetching issue #{number}");
        let response = self
            .request(Method::GET, &self.repo_path(&format!("/issues/{number}")))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn list_issues(&self, label: &str, state: IssueState) -> Result<Vec<Issue>> {
        debug!("Listing {state} issues labeled {label:?}");
        let per_page = PER_PAGE.to_string();
        let mut issues = Vec::new();
        for page in 1_u32.. {
            let page = page.to_string();
            let response = self
                .request(Method::GET, &self.repo_path("/issues"))
                .query(&[
                    ("labels", label),
                    ("state", state.as_str()),
                    ("per_page", per_page.as_str()),
                    ("page", page.as_str()),
                ])
                .send()
                .await?;
            let batch: Vec<Issue> = check_status(response).await?.json().await?;
            let last = batch.len() < PER_PAGE;
            issues.extend(batch.into_iter().filter(|issue| !issue.is_pull_request()));
            if last {
                break;
            }
        }
        Ok(issues)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        debug!("Creating issue {:?}", issue.title);
        let response = self
            .request(Method::POST, &self.repo_path("/issues"))
            .json(issue)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue> {
        debug!("Updating issue #{number}");
        let response = self
            .request(Method::PATCH, &self.repo_path(&format!("/issues/{number}")))
            .json(update)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<u64> {
        debug!("Posting comment to issue #{number}");
        let response = self
            .request(
                Method::POST,
                &self.repo_path(&format!("/issues/{number}/comments")),
            )
            .json(&json!({ "body": body }))
            .send()
            .await?;
        let comment: Comment = check_status(response).await?.json().await?;
        Ok(comment.id)
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        debug!("Updating comment {comment_id}");
        let response = self
            .request(
                Method::PATCH,
                &self.repo_path(&format!("/issues/comments/{comment_id}")),
            )
            .json(&json!({ "body": body }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn user_exists(&self, username: &str) -> Result<bool> {
        debug!("Checking if profile {username} exists");
        let response = self
            .request(Method::GET, &format!("/users/{username}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response).await?;
        Ok(true)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issue_json(number: u64, title: &str) -> serde_json::Value {
        json!({
            "number": number,
            "title": title,
            "body": null,
            "state": "open",
            "user": {"login": "jana"},
            "labels": [{"name": "check"}],
            "html_url": format!("https://github.com/juniorguru/eggtray/issues/{number}")
        })
    }

    fn client(server: &MockServer) -> GitHubClient {
        let repo = "juniorguru/eggtray".parse().unwrap();
        GitHubClient::new(server.uri(), repo, Some("secret".into())).unwrap()
    }

    #[test]
    fn mention_is_first_at_username() {
        assert_eq!(username_mention("please check @jane-doe thanks"), Some("jane-doe"));
        assert_eq!(username_mention("@a_b and @c"), Some("a_b"));
        assert_eq!(username_mention("Profile @jana má nedostatky"), Some("jana"));
        assert_eq!(username_mention("no mention here"), None);
    }

    #[test]
    fn repo_parses_owner_and_name() {
        let repo: Repo = "juniorguru/eggtray".parse().unwrap();
        assert_eq!(repo.owner, "juniorguru");
        assert_eq!(repo.name, "eggtray");
        assert_eq!(
            repo.run_url(42),
            "https://github.com/juniorguru/eggtray/actions/runs/42"
        );
    }

    #[test]
    fn repo_rejects_malformed() {
        for s in ["eggtray", "/eggtray", "juniorguru/", "a/b/c"] {
            assert!(s.parse::<Repo>().is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let value = serde_json::to_value(IssueUpdate::close()).unwrap();
        assert_eq!(value, json!({"state": "closed"}));
        assert!(IssueUpdate::default().is_empty());
    }

    #[tokio::test]
    async fn get_issue_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/juniorguru/eggtray/issues/7"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(7, "Check me")))
            .expect(1)
            .mount(&server)
            .await;

        let issue = client(&server).get_issue(7).await.unwrap();

        assert_eq!(issue.title, "Check me");
        assert_eq!(issue.user.unwrap().login, "jana");
        assert!(issue.labels.iter().any(|l| l.name == "check"));
    }

    #[tokio::test]
    async fn list_issues_skips_pull_requests() {
        let server = MockServer::start().await;
        let mut pr = issue_json(2, "A pull request");
        pr["pull_request"] = json!({"url": "https://api.github.com/..."});
        Mock::given(method("GET"))
            .and(path("/repos/juniorguru/eggtray/issues"))
            .and(query_param("labels", "profile not ready"))
            .and(query_param("state", "open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(1, "Profile @a has issues"), pr])))
            .mount(&server)
            .await;

        let issues = client(&server)
            .list_issues("profile not ready", IssueState::Open)
            .await
            .unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1);
    }

    #[tokio::test]
    async fn create_comment_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/juniorguru/eggtray/issues/7/comments"))
            .and(body_json(json!({"body": "Hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).create_comment(7, "Hello").await.unwrap(), 99);
    }

    #[tokio::test]
    async fn update_issue_patches_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/juniorguru/eggtray/issues/7"))
            .and(body_json(json!({"state": "closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(7, "Check me")))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_issue(7, &IssueUpdate::close())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_user_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/jana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "jana"})))
            .mount(&server)
            .await;

        let github = client(&server);
        assert!(!github.user_exists("ghost").await.unwrap());
        assert!(github.user_exists("jana").await.unwrap());
    }

    #[tokio::test]
    async fn other_failures_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/jana"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "rate limited"})))
            .mount(&server)
            .await;

        let err = client(&server).user_exists("jana").await.unwrap_err();
        assert!(
            matches!(&err, GitHubError::Api { status, message } if status.as_u16() == 403 && message == "rate limited")
        );
    }
}
