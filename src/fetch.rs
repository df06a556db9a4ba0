//! Concurrent fetching of summaries for a batch of profile configs.
//!
//! One request per unique username, all in flight at once. Results are
//! consumed as they complete. The first failure aborts the whole batch:
//! the remaining requests are dropped, not awaited.

use std::collections::BTreeMap;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::info;

use crate::checker::{CheckerError, ProfileChecker};
use crate::model::{ProfileConfig, Summary};

/// Why a batch fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("checking {username:?} failed: {source}")]
    Checker {
        username: String,
        #[source]
        source: CheckerError,
    },

    #[error("summary of {username:?} carries an error: {error}")]
    Failed { username: String, error: String },
}

/// Fetches a successful summary for every distinct username in `configs`.
///
/// The returned summaries are in completion order, not input order.
pub async fn fetch_summaries<C>(
    checker: &C,
    configs: &[ProfileConfig],
) -> Result<Vec<Summary>, FetchError>
where
    C: ProfileChecker + ?Sized,
{
    let urls: BTreeMap<&str, &str> = configs
        .iter()
        .map(|c| (c.username.as_str(), c.github_url.as_str()))
        .collect();

    let mut pending: FuturesUnordered<_> = urls
        .into_iter()
        .map(|(username, url)| async move { (username, checker.check_profile_url(url).await) })
        .collect();

    let mut summaries = Vec::with_capacity(pending.len());
    while let Some((username, result)) = pending.next().await {
        let summary = result.map_err(|source| FetchError::Checker {
            username: username.to_string(),
            source,
        })?;
        if let Some(error) = summary.error {
            return Err(FetchError::Failed {
                username: summary.username,
                error,
            });
        }
        info!("Processing {username:?} done");
        summaries.push(summary);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use mockall::predicate::eq;

    use crate::checker::MockProfileChecker;
    use crate::model::profile::fixtures::config;
    use crate::model::summary::fixtures::{failed_summary, summary};

    fn username_of(url: &str) -> &str {
        url.rsplit('/').next().unwrap()
    }

    #[tokio::test]
    async fn fetches_every_profile() {
        let mut checker = MockProfileChecker::new();
        checker
            .expect_check_profile_url()
            .times(3)
            .returning(|url| Ok(summary(username_of(url), vec![])));

        let configs = vec![config("adam"), config("bara"), config("cyril")];
        let mut summaries = fetch_summaries(&checker, &configs).await.unwrap();
        summaries.sort_by(|a, b| a.username.cmp(&b.username));

        let usernames: Vec<_> = summaries.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(usernames, vec!["adam", "bara", "cyril"]);
    }

    #[tokio::test]
    async fn fetches_each_username_once() {
        let mut checker = MockProfileChecker::new();
        checker
            .expect_check_profile_url()
            .with(eq("https://github.com/adam"))
            .times(1)
            .returning(|url| Ok(summary(username_of(url), vec![])));

        let configs = vec![config("adam"), config("adam")];
        let summaries = fetch_summaries(&checker, &configs).await.unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[tokio::test]
    async fn one_failed_summary_fails_the_batch() {
        let mut checker = MockProfileChecker::new();
        checker.expect_check_profile_url().returning(|url| {
            let username = username_of(url);
            if username == "dora" {
                Ok(failed_summary(username, "profile is private"))
            } else {
                Ok(summary(username, vec![]))
            }
        });

        let configs: Vec<_> = ["adam", "bara", "cyril", "dora", "emil"]
            .into_iter()
            .map(config)
            .collect();
        let err = fetch_summaries(&checker, &configs).await.unwrap_err();

        assert!(
            matches!(&err, FetchError::Failed { username, error } if username == "dora" && error == "profile is private")
        );
    }

    #[tokio::test]
    async fn checker_error_fails_the_batch() {
        let mut checker = MockProfileChecker::new();
        checker.expect_check_profile_url().returning(|url| {
            Err(CheckerError::Failed {
                username: username_of(url).to_string(),
                error: "timeout".into(),
            })
        });

        let err = fetch_summaries(&checker, &[config("adam")]).await.unwrap_err();
        assert!(matches!(err, FetchError::Checker { .. }));
    }

    /// Never answers for `slow`, fails at once for everyone else.
    struct StallingChecker;

    #[async_trait]
    impl ProfileChecker for StallingChecker {
        async fn check_profile_url(&self, url: &str) -> Result<Summary, CheckerError> {
            let username = username_of(url);
            if username == "slow" {
                std::future::pending::<()>().await;
            }
            Ok(failed_summary(username, "broken"))
        }
    }

    #[tokio::test]
    async fn failure_does_not_wait_for_requests_in_flight() {
        let configs = vec![config("slow"), config("broken")];
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            fetch_summaries(&StallingChecker, &configs),
        )
        .await
        .expect("batch should abort without waiting for the stalled request");

        assert!(matches!(result, Err(FetchError::Failed { .. })));
    }
}
