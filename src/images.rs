//! Project images: download one picture per project for the listing.
//!
//! Candidates are tried in order (README images, then the demo URL) and the
//! first image that downloads is saved under `<output_dir>/images/`. Every
//! failure is soft: it is logged and the next candidate is tried.
//!
//! Downloads share a semaphore created per run, so the concurrency limit is
//! a parameter rather than process-wide state.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::model::{Profile, Project};

pub const DEFAULT_IMAGE_CONCURRENCY: usize = 5;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGES_DIR: &str = "images";

/// Errors that stop image creation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to set up HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to create images directory: {0}")]
    Io(#[from] io::Error),
}

/// Downloads an image for every project and records it as the project's
/// `thumbnail_url`. Returns how many projects got one.
pub async fn create_project_images(
    profiles: &mut [Profile],
    output_dir: &Path,
    concurrency: usize,
) -> Result<usize, ImageError> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let limit = Semaphore::new(concurrency.max(1));
    let images_dir = output_dir.join(IMAGES_DIR);
    tokio::fs::create_dir_all(&images_dir).await?;

    let mut slugs = UniqueSlugs::default();
    let jobs: Vec<_> = profiles
        .iter()
        .enumerate()
        .flat_map(|(i, profile)| {
            profile
                .projects
                .iter()
                .enumerate()
                .map(move |(j, project)| (i, j, profile, project))
        })
        .map(|(i, j, profile, project)| {
            let slug = slugs.next(&format!("{} {}", profile.github_username, project.name));
            let (client, limit, images_dir) = (&client, &limit, &images_dir);
            async move { (i, j, create_project_image(client, limit, images_dir, project, &slug).await) }
        })
        .collect();
    let results = join_all(jobs).await;

    let mut created = 0;
    for (i, j, thumbnail_url) in results {
        if thumbnail_url.is_some() {
            created += 1;
        }
        profiles[i].projects[j].thumbnail_url = thumbnail_url;
    }
    Ok(created)
}

/// Tries each candidate URL until one yields a saved image.
async fn create_project_image(
    client: &reqwest::Client,
    limit: &Semaphore,
    images_dir: &Path,
    project: &Project,
    slug: &str,
) -> Option<String> {
    for (attempt, url) in project.image_urls().enumerate() {
        info!(
            "Attempt #{} to download image for {}: {url}",
            attempt + 1,
            project.name
        );
        let Some((bytes, extension)) = try_download(client, limit, url).await else {
            continue;
        };
        let filename = format!("{slug}.{extension}");
        match tokio::fs::write(images_dir.join(&filename), &bytes).await {
            Ok(()) => {
                info!("Saved image for {} from {url} as {filename}", project.name);
                return Some(format!("{IMAGES_DIR}/{filename}"));
            }
            Err(e) => debug!("Error while saving image for {}: {e}", project.name),
        }
    }
    None
}

/// Downloads `url` if it is an image, returning its bytes and file extension.
async fn try_download(
    client: &reqwest::Client,
    limit: &Semaphore,
    url: &str,
) -> Option<(Vec<u8>, &'static str)> {
    let _permit = limit.acquire().await.ok()?;

    let response = match client.get(url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            debug!("Error while downloading {url}: {e}");
            return None;
        }
    };

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let Some(extension) = image_extension(&content_type) else {
        debug!("Not an image: {content_type:?} from {url}");
        return None;
    };

    match response.bytes().await {
        Ok(bytes) => Some((bytes.to_vec(), extension)),
        Err(e) => {
            debug!("Error while reading {url}: {e}");
            None
        }
    }
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// Lowercase ASCII alphanumerics separated by single dashes.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Hands out slugs not used before in the same run. Repeats get a numeric
/// suffix: `jana-my-app`, `jana-my-app-2`, ...
#[derive(Default)]
struct UniqueSlugs {
    used: HashSet<String>,
}

impl UniqueSlugs {
    fn next(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut slug = base.clone();
        let mut n = 1;
        while !self.used.insert(slug.clone()) {
            n += 1;
            slug = format!("{base}-{n}");
        }
        slug
    }
}
