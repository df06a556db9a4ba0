//! The listing: every profile of a build, plus the schema they follow.

use schemars::schema_for;
use serde::{Deserialize, Serialize};

use super::Profile;

/// The build's published artifact, written as `profiles.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Listing {
    pub count: usize,
    /// Sorted by username.
    pub items: Vec<Profile>,
    /// JSON schema of a single item, for downstream consumers.
    pub item_schema: serde_json::Value,
}

impl Listing {
    /// Wraps profiles, counting them and embedding the profile schema.
    pub fn create(profiles: Vec<Profile>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            count: profiles.len(),
            items: profiles,
            item_schema: serde_json::to_value(schema_for!(Profile))?,
        })
    }
}
