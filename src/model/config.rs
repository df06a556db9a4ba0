//! Profile configs: the YAML documents people submit about themselves.
//!
//! One document per person, named `{username}.yml`. The username and the
//! GitHub URL are derived from the filename and never written in the YAML.
//! Unknown keys are rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use super::{Experience, Language, School, Skill};

/// Fields set from the filename rather than the document.
const DERIVED_FIELDS: [&str; 2] = ["username", "github_url"];

/// Errors raised while loading profile configs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid YAML: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("profile of {username:?} does not conform to the schema: {message}")]
    Schema { username: String, message: String },

    #[error("cannot derive a username from {}", .0.display())]
    InvalidFilename(PathBuf),

    #[error("username {username:?} is used by more than one file: {}", paths_display(.paths))]
    DuplicateUsername {
        username: String,
        paths: Vec<PathBuf>,
    },

    #[error("no profile configs found in {}", .0.display())]
    NoProfiles(PathBuf),
}

fn paths_display(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A person's profile config, validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub username: String,
    pub github_url: String,
    #[serde(default)]
    pub discord_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub looking_for: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub skills: BTreeSet<Skill>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub experience: BTreeSet<Experience>,
    /// Nullable, but the key must be present.
    #[serde(deserialize_with = "present_or_null")]
    pub secondary_school: Option<School>,
    /// Nullable, but the key must be present.
    #[serde(deserialize_with = "present_or_null")]
    pub university: Option<School>,
    pub languages: Vec<Language>,
}

/// Deserializes an `Option` whose key is required even though its value may be null.
///
/// Serde only reports a missing field for `Option` when `deserialize_with` is set.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer)
}

impl ProfileConfig {
    /// Validates a parsed YAML document on behalf of `username`.
    pub fn create(username: &str, data: Value) -> Result<Self, ConfigError> {
        let schema_error = |message: String| ConfigError::Schema {
            username: username.to_string(),
            message,
        };

        let mut mapping = match data {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(schema_error("document must be a mapping".to_string())),
        };

        for field in DERIVED_FIELDS {
            if mapping.contains_key(field) {
                return Err(schema_error(format!(
                    "`{field}` is derived from the filename and must not be set"
                )));
            }
        }

        mapping.insert("username".into(), username.into());
        mapping.insert("github_url".into(), github_url(username).into());

        serde_yaml::from_value(Value::Mapping(mapping)).map_err(|e| schema_error(e.to_string()))
    }
}

/// The GitHub profile URL of a username.
pub fn github_url(username: &str) -> String {
    format!("https://github.com/{username}")
}

/// The username a profile file stands for: its lowercased stem.
pub fn username_from_path(path: &Path) -> Result<String, ConfigError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| ConfigError::InvalidFilename(path.to_path_buf()))
}

/// Loads a single profile config file.
pub fn load_profile_config(path: &Path) -> Result<ProfileConfig, ConfigError> {
    let username = username_from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    ProfileConfig::create(&username, data)
}

/// Lists the `*.yml` files of a configs directory, sorted.
///
/// Other files are reported and skipped.
pub fn profile_config_paths(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("yml") {
            paths.push(path);
        } else {
            warn!("Ignoring {}, profile configs must end with .yml", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads every profile config in a directory.
///
/// Fails if the directory holds no profiles, if any document is invalid,
/// or if two files map to the same username.
pub fn load_profile_configs(dir: &Path) -> Result<Vec<ProfileConfig>, ConfigError> {
    let paths = profile_config_paths(dir)?;
    if paths.is_empty() {
        return Err(ConfigError::NoProfiles(dir.to_path_buf()));
    }
    check_unique_usernames(&paths)?;

    paths
        .iter()
        .map(|path| {
            debug!("Loading {}", path.display());
            load_profile_config(path)
        })
        .collect()
}

fn check_unique_usernames(paths: &[PathBuf]) -> Result<(), ConfigError> {
    let mut by_username: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        by_username
            .entry(username_from_path(path)?)
            .or_default()
            .push(path.clone());
    }
    match by_username.into_iter().find(|(_, paths)| paths.len() > 1) {
        Some((username, paths)) => Err(ConfigError::DuplicateUsername { username, paths }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const FULL: &str = "\
discord_id: 123456789
name: Jana Nováková
bio: Learning Rust on weekends.
looking_for: A junior backend position.
email: jana@example.com
location: Brno
skills: [python, django, python, docker]
domains: [healthcare, fintech]
experience: [intern]
secondary_school: it
university: null
languages: [cs, en]
";

    const MINIMAL: &str = "\
skills: [rust]
secondary_school: null
university: math
languages: [en]
";

    fn parse(username: &str, yaml: &str) -> Result<ProfileConfig, ConfigError> {
        ProfileConfig::create(username, serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn creates_config_with_derived_fields() {
        let config = parse("jana", FULL).unwrap();

        assert_eq!(config.username, "jana");
        assert_eq!(config.github_url, "https://github.com/jana");
        assert_eq!(config.discord_id, Some(123_456_789));
        assert_eq!(config.name.as_deref(), Some("Jana Nováková"));
        assert_eq!(
            config.skills,
            BTreeSet::from([Skill::Python, Skill::Django, Skill::Docker])
        );
        assert_eq!(config.domains, vec!["healthcare", "fintech"]);
        assert_eq!(config.secondary_school, Some(School::It));
        assert_eq!(config.university, None);
        assert_eq!(config.languages.len(), 2);
    }

    #[test]
    fn optional_fields_default() {
        let config = parse("petr", MINIMAL).unwrap();

        assert_eq!(config.name, None);
        assert!(config.domains.is_empty());
        assert!(config.experience.is_empty());
        assert_eq!(config.university, Some(School::Math));
    }

    #[test]
    fn reserializing_is_stable() {
        for (username, yaml) in [("jana", FULL), ("petr", MINIMAL)] {
            let config = parse(username, yaml).unwrap();
            let value = serde_yaml::to_value(&config).unwrap();
            let again: ProfileConfig = serde_yaml::from_value(value).unwrap();
            assert_eq!(again, config);
        }
    }

    #[test]
    fn rejects_unknown_fields() {
        let yaml = format!("{MINIMAL}favourite_color: green\n");
        let err = parse("petr", &yaml).unwrap_err();
        assert!(err.to_string().contains("favourite_color"), "{err}");
    }

    #[test]
    fn rejects_username_in_document() {
        let yaml = format!("{MINIMAL}username: someone-else\n");
        assert!(matches!(
            parse("petr", &yaml).unwrap_err(),
            ConfigError::Schema { .. }
        ));
    }

    #[test]
    fn school_keys_must_be_present() {
        let yaml = "skills: [rust]\nuniversity: null\nlanguages: [en]\n";
        let err = parse("petr", yaml).unwrap_err();
        assert!(err.to_string().contains("secondary_school"), "{err}");
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let yaml = "skills: [cobol]\nsecondary_school: null\nuniversity: null\nlanguages: [en]\n";
        assert!(parse("petr", yaml).is_err());

        let yaml = "skills: [rust]\nsecondary_school: null\nuniversity: null\nlanguages: [xx]\n";
        assert!(parse("petr", yaml).is_err());
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert!(parse("petr", "- rust\n- python\n").is_err());
    }

    #[test]
    fn loads_directory_lowercasing_usernames() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Jana.yml"), FULL).unwrap();
        fs::write(dir.path().join("petr.yml"), MINIMAL).unwrap();
        fs::write(dir.path().join("README.md"), "# Profiles").unwrap();

        let configs = load_profile_configs(dir.path()).unwrap();
        let usernames: Vec<_> = configs.iter().map(|c| c.username.as_str()).collect();

        assert_eq!(usernames, vec!["jana", "petr"]);
        assert_eq!(configs[0].github_url, "https://github.com/jana");
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Jana.yml"), FULL).unwrap();
        fs::write(dir.path().join("jana.yml"), MINIMAL).unwrap();

        let err = load_profile_configs(dir.path()).unwrap_err();
        assert!(
            matches!(&err, ConfigError::DuplicateUsername { username, paths } if username == "jana" && paths.len() == 2),
            "{err}"
        );
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_profile_configs(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles(_)));
    }

    #[test]
    fn invalid_yaml_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.yml"), "skills: [rust\n").unwrap();

        let err = load_profile_configs(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("broken.yml"));
    }
}
