//! Language codes.
//!
//! The valid set is the ISO 639-1 table embedded from `data/iso639-1.txt`,
//! parsed once on first use.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use serde::{Deserialize, Serialize};

const ISO_639_1: &str = include_str!("../../data/iso639-1.txt");

static LANGUAGE_CODES: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    ISO_639_1
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
});

/// A two-letter ISO 639-1 language code, e.g. `cs` or `en`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Language(String);

impl Language {
    /// All known codes, sorted.
    pub fn codes() -> impl Iterator<Item = &'static str> {
        LANGUAGE_CODES.iter().copied()
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        if LANGUAGE_CODES.contains(code.as_str()) {
            Ok(Self(code))
        } else {
            Err(format!("unknown language code: {code:?}"))
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl JsonSchema for Language {
    fn schema_name() -> String {
        "Language".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(Self::codes().map(serde_json::Value::from).collect()),
            ..Default::default()
        }
        .into()
    }
}
