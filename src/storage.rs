//! Local persistence: the listing file and the build cache.
//!
//! ```text
//! <output_dir>/profiles.json          # Listing, the build's artifact
//! <cache_dir>/summaries.sqlite        # Cached checker summaries, see `BuildCache`
//! ```

mod cache;

use std::{fs, io, path::Path};

pub use cache::{BuildCache, DEFAULT_CACHE_HOURS, cache_key};

use crate::model::Listing;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Writes a listing as pretty JSON, creating parent directories.
pub fn write_listing(path: &Path, listing: &Listing) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(listing)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads a listing written by [`write_listing`].
pub fn read_listing(path: &Path) -> Result<Listing> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
