//! Eggtray settings.
//!
//! Loaded from `./eggtray.toml`, or `<config dir>/eggtray/config.toml` when
//! there's none in the working directory. Both are optional. Every key has
//! a built-in default and command-line flags override them all.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::messages::Locale;

const LOCAL_FILE: &str = "eggtray.toml";

/// Eggtray settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Repository holding check and report issues, as `owner/repo`.
    pub repo: Option<String>,
    pub check_label: Option<String>,
    pub report_label: Option<String>,
    pub locale: Option<Locale>,
    /// Endpoint of the profile checking service.
    pub checker_url: Option<String>,
    /// GitHub REST API base URL, for GitHub Enterprise.
    pub github_api_url: Option<String>,
    pub cache_hours: Option<u32>,
    /// Seconds to wait for the profile checker per profile.
    pub checker_timeout: Option<u64>,
}

impl Settings {
    /// Loads settings from the first settings file found, or defaults.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads settings from `path`. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid settings at {}: {e}", path.display()))
    }

    /// The settings file in use, if any exists.
    pub fn path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("eggtray").join("config.toml"))
            .filter(|path| path.exists())
    }
}
