use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named rules file inside a ruleset source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesSource {
    /// File name as reported back in compile errors (e.g. `firestore.rules`).
    pub name: String,
    /// Raw rule-language text, passed through verbatim.
    pub content: String,
}

impl RulesSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Source bundle of a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub files: Vec<RulesSource>,
}

/// A server-stored, immutable ruleset.
///
/// The name has the form `projects/{project}/rulesets/{uuid}` and is assigned
/// by the server on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

/// Input for creating a new ruleset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRulesetInput {
    pub source: Source,
}
