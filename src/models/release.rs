use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release id of the default Firestore database.
pub const FIRESTORE_RELEASE: &str = "cloud.firestore";

/// Name of the default Firestore database.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Binding of a logical target to the ruleset currently serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Full release name, e.g. `projects/p/releases/cloud.firestore`.
    pub name: String,
    /// Full ruleset name the release points at.
    pub ruleset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Release {
    pub fn new(name: impl Into<String>, ruleset_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ruleset_name: ruleset_name.into(),
            create_time: None,
            update_time: None,
        }
    }
}

/// Body of a release update (`PATCH releases/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReleaseInput {
    pub release: Release,
}

/// Release id serving the given Firestore database.
///
/// The default database keeps the historical `cloud.firestore` id; named
/// databases get `cloud.firestore/{database}`.
pub fn firestore_release_id(database: &str) -> String {
    if database.is_empty() || database == DEFAULT_DATABASE {
        FIRESTORE_RELEASE.to_string()
    } else {
        format!("{}/{}", FIRESTORE_RELEASE, database)
    }
}
