//! GitHub credentials: a plain token or a GitHub App installation.
//!
//! The CLI assembles a [`GitHubAuth`] from named, env-backed options before
//! dispatch and hands it to the command explicitly. App credentials are
//! exchanged for an installation token via a short-lived RS256 JWT.

use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitHub rejects JWTs valid for longer than ten minutes.
const JWT_LIFETIME_SECS: i64 = 540;
/// Allowance for clock drift between us and GitHub.
const JWT_BACKDATE_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(
        "no GitHub credentials: set GITHUB_TOKEN, or GITHUB_CLIENT_ID, GITHUB_INSTALLATION_ID and GITHUB_PRIVATE_KEY"
    )]
    Missing,

    #[error("incomplete GitHub App credentials: missing {0}")]
    Incomplete(&'static str),

    #[error("invalid GitHub App private key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("request for installation token failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub refused installation token with {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// GitHub App installation credentials.
#[derive(Clone)]
pub struct AppCredentials {
    pub client_id: String,
    pub installation_id: u64,
    pub private_key: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("installation_id", &self.installation_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// How to authenticate against the GitHub API.
#[derive(Clone)]
pub enum GitHubAuth {
    Token(String),
    App(AppCredentials),
}

impl fmt::Debug for GitHubAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::App(app) => f.debug_tuple("App").field(app).finish(),
        }
    }
}

impl GitHubAuth {
    /// A bearer token for API calls, exchanging App credentials if needed.
    pub async fn token(&self, api_url: &str) -> Result<String, AuthError> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::App(app) => installation_token(app, api_url).await,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

fn app_jwt(app: &AppCredentials, now: Timestamp) -> Result<String, AuthError> {
    let key = EncodingKey::from_rsa_pem(app.private_key.as_bytes())?;
    let claims = AppClaims {
        iat: now.as_second() - JWT_BACKDATE_SECS,
        exp: now.as_second() + JWT_LIFETIME_SECS,
        iss: app.client_id.clone(),
    };
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &key,
    )?)
}

#[derive(Deserialize)]
struct InstallationToken {
    token: String,
}

async fn installation_token(app: &AppCredentials, api_url: &str) -> Result<String, AuthError> {
    debug!(
        "Requesting installation token for installation {}",
        app.installation_id
    );
    let jwt = app_jwt(app, Timestamp::now())?;
    let version = env!("CARGO_PKG_VERSION");
    let client = reqwest::Client::builder()
        .user_agent(format!("eggtray/{version}"))
        .timeout(Duration::from_secs(30))
        .build()?;

    let url = format!(
        "{}/app/installations/{}/access_tokens",
        api_url.trim_end_matches('/'),
        app.installation_id
    );
    let response = client
        .post(url)
        .bearer_auth(jwt)
        .header(ACCEPT, "application/vnd.github+json")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Api { status, body });
    }
    let InstallationToken { token } = response.json().await?;
    Ok(token)
}

/// Env-backed credential options shared by the commands talking to GitHub.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AuthArgs {
    /// GitHub token. Used when no GitHub App credentials are given.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub App's client ID.
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    pub github_client_id: Option<String>,

    /// GitHub App's installation ID.
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    pub github_installation_id: Option<u64>,

    /// GitHub App's private key (PEM). Literal `\n` sequences become newlines.
    #[arg(
        long,
        env = "GITHUB_PRIVATE_KEY",
        hide_env_values = true,
        value_parser = multiline
    )]
    pub github_private_key: Option<String>,
}

fn multiline(value: &str) -> Result<String, String> {
    Ok(value.replace("\\n", "\n"))
}

impl AuthArgs {
    /// Picks the App when any App option is set, otherwise the token.
    pub fn resolve(self) -> Result<GitHubAuth, AuthError> {
        let any_app = self.github_client_id.is_some()
            || self.github_installation_id.is_some()
            || self.github_private_key.is_some();
        if !any_app {
            return self.github_token.map(GitHubAuth::Token).ok_or(AuthError::Missing);
        }

        Ok(GitHubAuth::App(AppCredentials {
            client_id: self
                .github_client_id
                .ok_or(AuthError::Incomplete("GITHUB_CLIENT_ID"))?,
            installation_id: self
                .github_installation_id
                .ok_or(AuthError::Incomplete("GITHUB_INSTALLATION_ID"))?,
            private_key: self
                .github_private_key
                .ok_or(AuthError::Incomplete("GITHUB_PRIVATE_KEY"))?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRIVATE_KEY: &str = include_str!("../testdata/app-key.pem");
    const PUBLIC_KEY: &str = include_str!("../testdata/app-key.pub.pem");

    fn app() -> AppCredentials {
        AppCredentials {
            client_id: "Iv1.abc".into(),
            installation_id: 42,
            private_key: PRIVATE_KEY.into(),
        }
    }

    #[test]
    fn token_only_resolves_to_token() {
        let args = AuthArgs {
            github_token: Some("ghp_x".into()),
            ..AuthArgs::default()
        };
        assert!(matches!(args.resolve().unwrap(), GitHubAuth::Token(t) if t == "ghp_x"));
    }

    #[test]
    fn app_credentials_win_over_token() {
        let args = AuthArgs {
            github_token: Some("ghp_x".into()),
            github_client_id: Some("Iv1.abc".into()),
            github_installation_id: Some(42),
            github_private_key: Some(PRIVATE_KEY.into()),
        };
        assert!(matches!(args.resolve().unwrap(), GitHubAuth::App(app) if app.installation_id == 42));
    }

    #[test]
    fn partial_app_credentials_are_rejected() {
        let args = AuthArgs {
            github_client_id: Some("Iv1.abc".into()),
            ..AuthArgs::default()
        };
        assert!(matches!(
            args.resolve().unwrap_err(),
            AuthError::Incomplete("GITHUB_INSTALLATION_ID")
        ));
    }

    #[test]
    fn nothing_set_is_missing() {
        assert!(matches!(
            AuthArgs::default().resolve().unwrap_err(),
            AuthError::Missing
        ));
    }

    #[test]
    fn escaped_newlines_are_unescaped() {
        assert_eq!(multiline("a\\nb\\nc").unwrap(), "a\nb\nc");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?} {:?}", GitHubAuth::Token("ghp_x".into()), GitHubAuth::App(app()));
        assert!(!rendered.contains("ghp_x"));
        assert!(!rendered.contains("PRIVATE KEY"));
    }

    #[test]
    fn jwt_is_signed_for_the_app() {
        let now = Timestamp::now();
        let jwt = app_jwt(&app(), now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&["Iv1.abc"]);
        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let claims = jsonwebtoken::decode::<AppClaims>(&jwt, &key, &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.iat, now.as_second() - 60);
        assert_eq!(claims.exp, now.as_second() + 540);
    }

    #[test]
    fn garbage_key_is_rejected() {
        let app = AppCredentials {
            private_key: "not a key".into(),
            ..app()
        };
        assert!(matches!(app_jwt(&app, Timestamp::now()), Err(AuthError::Key(_))));
    }

    #[tokio::test]
    async fn app_exchanges_jwt_for_installation_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/42/access_tokens"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "ghs_installation"})))
            .expect(1)
            .mount(&server)
            .await;

        let token = GitHubAuth::App(app()).token(&server.uri()).await.unwrap();
        assert_eq!(token, "ghs_installation");
    }

    #[tokio::test]
    async fn refused_exchange_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let err = GitHubAuth::App(app()).token(&server.uri()).await.unwrap_err();
        assert!(matches!(err, AuthError::Api { status, .. } if status.as_u16() == 401));
    }
}
