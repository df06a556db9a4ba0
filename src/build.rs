//! The build: profile configs in, `profiles.json` out.
//!
//! 1. Load and validate every `*.yml` in the configs directory.
//! 2. Reuse cached summaries for the same set of usernames, or fetch them.
//! 3. Merge configs with summaries into profiles.
//! 4. Optionally download project images.
//! 5. Write the listing.
//!
//! The cache is advisory. Any failure in it is logged and the build goes on
//! with a live fetch.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::checker::ProfileChecker;
use crate::fetch::{FetchError, fetch_summaries};
use crate::images::{DEFAULT_IMAGE_CONCURRENCY, ImageError, create_project_images};
use crate::model::{
    ConfigError, Listing, MergeError, ProfileConfig, Summary, create_profiles,
    load_profile_configs,
};
use crate::storage::{BuildCache, DEFAULT_CACHE_HOURS, StorageError, cache_key, write_listing};

pub const LISTING_FILE: &str = "profiles.json";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to create profiles: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Images(#[from] ImageError),

    #[error("failed to generate profile schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("failed to write listing: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Where to keep the summary cache. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    pub cache_hours: u32,
    /// Download project images into the output directory.
    pub images: bool,
    pub images_concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            cache_dir: Some(PathBuf::from(".cache")),
            cache_hours: DEFAULT_CACHE_HOURS,
            images: false,
            images_concurrency: DEFAULT_IMAGE_CONCURRENCY,
        }
    }
}

/// Builds the listing from `configs_dir` into `output_dir/profiles.json`.
pub async fn build<C>(
    checker: &C,
    configs_dir: &Path,
    output_dir: &Path,
    options: &BuildOptions,
) -> Result<Listing, BuildError>
where
    C: ProfileChecker + ?Sized,
{
    info!("Profile configs directory: {}", configs_dir.display());
    let configs = load_profile_configs(configs_dir)?;
    info!("Found {} profile configs", configs.len());

    let summaries = summaries(checker, &configs, options).await?;

    info!("Creating profiles");
    let mut profiles = create_profiles(configs, summaries)?;

    if options.images {
        info!("Downloading project images");
        let created = create_project_images(&mut profiles, output_dir, options.images_concurrency).await?;
        info!("Created {created} project images");
    }

    let path = output_dir.join(LISTING_FILE);
    info!("Writing {} profiles to {}", profiles.len(), path.display());
    let listing = Listing::create(profiles).map_err(BuildError::Schema)?;
    write_listing(&path, &listing)?;
    Ok(listing)
}

/// Cached summaries for this set of usernames, or freshly fetched ones.
async fn summaries<C>(
    checker: &C,
    configs: &[ProfileConfig],
    options: &BuildOptions,
) -> Result<Vec<Summary>, FetchError>
where
    C: ProfileChecker + ?Sized,
{
    let key = cache_key(configs);
    let cache = options.cache_dir.as_deref().and_then(|dir| {
        debug!("Cache: {}", dir.display());
        BuildCache::open(dir, options.cache_hours)
            .inspect_err(|e| warn!("Cache unavailable, continuing without: {e}"))
            .ok()
    });

    if let Some(cache) = &cache {
        match cache.get(&key) {
            Ok(Some(summaries)) => {
                warn!("Using cached summaries of GitHub profiles");
                return Ok(summaries);
            }
            Ok(None) => debug!("No cached summaries"),
            Err(e) => warn!("Failed to read cache: {e}"),
        }
    }

    info!("Analyzing GitHub profiles");
    let summaries = fetch_summaries(checker, configs).await?;

    if let Some(cache) = &cache
        && let Err(e) = cache.set(&key, &summaries)
    {
        warn!("Failed to write cache: {e}");
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::checker::MockProfileChecker;
    use crate::model::Status;
    use crate::model::summary::fixtures::{outcome, summary};
    use crate::storage::read_listing;

    const PROFILE: &str = "\
name: Jana
skills: [rust]
secondary_school: null
university: null
languages: [cs]
";

    fn configs_dir(usernames: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for username in usernames {
            fs::write(dir.path().join(format!("{username}.yml")), PROFILE).unwrap();
        }
        dir
    }

    fn checker(times: usize) -> MockProfileChecker {
        let mut checker = MockProfileChecker::new();
        checker.expect_check_profile_url().times(times).returning(|url| {
            let username = url.rsplit('/').next().unwrap();
            Ok(summary(username, vec![outcome(Status::Error, "No avatar")]))
        });
        checker
    }

    fn options(cache_dir: Option<PathBuf>) -> BuildOptions {
        BuildOptions {
            cache_dir,
            ..BuildOptions::default()
        }
    }

    #[tokio::test]
    async fn writes_sorted_listing() {
        let configs = configs_dir(&["Zoe", "adam"]);
        let output = TempDir::new().unwrap();

        let listing = build(&checker(2), configs.path(), output.path(), &options(None))
            .await
            .unwrap();

        let usernames: Vec<_> = listing.items.iter().map(|p| p.github_username.as_str()).collect();
        assert_eq!(usernames, vec!["adam", "zoe"]);
        assert!(listing.items.iter().all(|p| !p.is_ready));

        let written = read_listing(&output.path().join(LISTING_FILE)).unwrap();
        assert_eq!(written, listing);
    }

    #[tokio::test]
    async fn empty_configs_dir_fails() {
        let configs = configs_dir(&[]);
        let output = TempDir::new().unwrap();

        let err = build(&checker(0), configs.path(), output.path(), &options(None))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Config(ConfigError::NoProfiles(_))));
        assert!(!output.path().join(LISTING_FILE).exists());
    }

    #[tokio::test]
    async fn second_build_uses_cache() {
        let configs = configs_dir(&["adam", "zoe"]);
        let output = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let options = options(Some(cache.path().to_path_buf()));

        build(&checker(2), configs.path(), output.path(), &options)
            .await
            .unwrap();
        let listing = build(&checker(0), configs.path(), output.path(), &options)
            .await
            .unwrap();

        assert_eq!(listing.count, 2);
    }

    #[tokio::test]
    async fn broken_cache_falls_back_to_fetching() {
        let configs = configs_dir(&["adam"]);
        let output = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(cache.path().join("summaries.sqlite"), "not a database").unwrap();

        let listing = build(
            &checker(1),
            configs.path(),
            output.path(),
            &options(Some(cache.path().to_path_buf())),
        )
        .await
        .unwrap();

        assert_eq!(listing.count, 1);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_build() {
        let configs = configs_dir(&["adam"]);
        let output = TempDir::new().unwrap();
        let mut checker = MockProfileChecker::new();
        checker
            .expect_check_profile_url()
            .returning(|_| Ok(crate::model::summary::fixtures::failed_summary("adam", "private")));

        let err = build(&checker, configs.path(), output.path(), &options(None))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Fetch(FetchError::Failed { .. })));
        assert!(!output.path().join(LISTING_FILE).exists());
    }
}
