//! Core data model for eggtray.
//!
//! Profile configs come in from YAML, summaries come back from the checker,
//! and the two merge into the profiles of a listing.

mod config;
mod enums;
mod language;
mod listing;
pub(crate) mod profile;
pub(crate) mod summary;

pub use config::{ConfigError, ProfileConfig, github_url, load_profile_configs};
pub use enums::{Experience, School, Skill};
pub use language::Language;
pub use listing::Listing;
pub use profile::{MergeError, Profile, Project, create_profiles};
pub use summary::{Info, Outcome, ProjectInfo, Status, Summary, is_ready};
