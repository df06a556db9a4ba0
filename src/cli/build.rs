//! `eggtray build`.

use std::path::PathBuf;

use tracing::info;

use crate::build::{BuildOptions, build};
use crate::checker::{CheckerOptions, ServiceChecker};
use crate::images::DEFAULT_IMAGE_CONCURRENCY;
use crate::settings::Settings;
use crate::storage::DEFAULT_CACHE_HOURS;

use super::checker_timeout;

#[derive(Debug, clap::Args)]
pub struct BuildArgs {
    /// Directory with profile configs, one `<username>.yml` per profile.
    #[arg(default_value = "profiles")]
    pub(super) configs_dir: PathBuf,

    /// Directory to write `profiles.json` (and images) into.
    #[arg(default_value = "output")]
    pub(super) output_dir: PathBuf,

    /// Directory of the summary cache.
    #[arg(long, default_value = ".cache")]
    pub(super) cache_dir: PathBuf,

    /// How long cached summaries stay valid. Defaults to 3.
    #[arg(long)]
    pub(super) cache_hours: Option<u32>,

    /// Always fetch fresh summaries.
    #[arg(long)]
    pub(super) no_cache: bool,

    /// Download an image for every project.
    #[arg(long)]
    pub(super) images: bool,

    /// How many images to download at once.
    #[arg(long, default_value_t = DEFAULT_IMAGE_CONCURRENCY)]
    pub(super) images_concurrency: usize,

    /// GitHub token the profile checker should use.
    #[arg(long, env = "GITHUB_API_KEY", hide_env_values = true)]
    pub(super) github_api_key: Option<String>,

    /// Endpoint of the profile checking service.
    #[arg(long, env = "EGGTRAY_CHECKER_URL")]
    pub(super) checker_url: Option<String>,

    /// Seconds to wait for the profile checker per profile. Defaults to 600.
    #[arg(long, value_name = "SECS")]
    pub(super) checker_timeout: Option<u64>,
}

pub(super) async fn cmd_build(args: BuildArgs, settings: &Settings) -> Result<(), String> {
    info!(
        "Using GitHub token: {}",
        if args.github_api_key.is_some() { "yes" } else { "no" }
    );
    info!("Output directory: {}", args.output_dir.display());
    if !args.configs_dir.is_dir() {
        return Err(format!("{} is not a directory", args.configs_dir.display()));
    }

    let checker_url = args
        .checker_url
        .or_else(|| settings.checker_url.clone())
        .ok_or("no profile checker configured: use --checker-url or EGGTRAY_CHECKER_URL")?;
    let checker = ServiceChecker::new(
        checker_url,
        CheckerOptions {
            github_api_key: args.github_api_key,
            raise_on_error: true,
            timeout: checker_timeout(args.checker_timeout, settings),
        },
    )
    .map_err(|e| format!("failed to set up profile checker: {e}"))?;

    let options = BuildOptions {
        cache_dir: (!args.no_cache).then_some(args.cache_dir),
        cache_hours: args
            .cache_hours
            .or(settings.cache_hours)
            .unwrap_or(DEFAULT_CACHE_HOURS),
        images: args.images,
        images_concurrency: args.images_concurrency,
    };

    let listing = build(&checker, &args.configs_dir, &args.output_dir, &options)
        .await
        .map_err(|e| format!("build failed: {e}"))?;

    info!("Built listing of {} profiles", listing.count);
    Ok(())
}
