//! Upload-and-activate workflow for security rules.
//!
//! The pipeline is fixed: load the rules file, create a ruleset from it, then
//! point the Firestore release at the new ruleset. Every step either hands its
//! result to the next one or ends the run with a [`DeployOutcome`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::client::{ClientError, RulesClient};
use crate::models::*;

/// Default location of the rules file.
pub const DEFAULT_RULES_PATH: &str = "firestore.rules";

/// Remote operations the deployer needs.
#[async_trait]
pub trait RulesApi: Send + Sync {
    /// Create a new immutable ruleset. Never idempotent.
    async fn create_ruleset(&self, files: &[RulesSource]) -> Result<Ruleset, ClientError>;

    /// Bind `release_id` to `ruleset_name`, creating the release if needed.
    async fn release_ruleset(
        &self,
        release_id: &str,
        ruleset_name: &str,
    ) -> Result<Release, ClientError>;
}

#[async_trait]
impl RulesApi for RulesClient<'_> {
    async fn create_ruleset(&self, files: &[RulesSource]) -> Result<Ruleset, ClientError> {
        RulesClient::create_ruleset(self, files).await
    }

    async fn release_ruleset(
        &self,
        release_id: &str,
        ruleset_name: &str,
    ) -> Result<Release, ClientError> {
        RulesClient::release_ruleset(self, release_id, ruleset_name).await
    }
}

/// How a deployment ended.
#[derive(Debug)]
pub enum DeployOutcome {
    /// The ruleset was created and is now live.
    Activated { ruleset: Ruleset, release: Release },
    /// The rules file does not exist. Nothing was sent.
    SourceMissing { path: PathBuf },
    /// The rules file exists but could not be read as text. Nothing was sent.
    SourceUnreadable {
        path: PathBuf,
        error: std::io::Error,
    },
    /// Ruleset creation failed. No activation was attempted.
    CreateFailed { error: ClientError },
    /// The ruleset exists remotely but the release still points at the old one.
    ReleaseFailed { ruleset: Ruleset, error: ClientError },
}

/// Read the rules file verbatim.
///
/// Returns `Ok(None)` when the path is not an existing regular file.
pub fn load_source(path: &Path) -> std::io::Result<Option<RulesSource>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_RULES_PATH.to_string());
    Ok(Some(RulesSource::new(name, content)))
}

/// Runs the load → create → activate pipeline against a [`RulesApi`].
pub struct Deployer<'a, A: RulesApi> {
    api: &'a A,
    release_id: String,
}

impl<'a, A: RulesApi> Deployer<'a, A> {
    /// Deployer for the release serving `database`.
    pub fn new(api: &'a A, database: &str) -> Self {
        Self {
            api,
            release_id: firestore_release_id(database),
        }
    }

    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    pub async fn deploy(&self, rules_path: &Path) -> DeployOutcome {
        tracing::info!(path = %rules_path.display(), "Reading rules file");
        let source = match load_source(rules_path) {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::error!(path = %rules_path.display(), "Rules file not found");
                return DeployOutcome::SourceMissing {
                    path: rules_path.to_path_buf(),
                };
            }
            Err(error) => {
                tracing::error!(path = %rules_path.display(), error = %error, "Failed to read rules file");
                return DeployOutcome::SourceUnreadable {
                    path: rules_path.to_path_buf(),
                    error,
                };
            }
        };

        tracing::info!(file = %source.name, bytes = source.content.len(), "Creating ruleset");
        let ruleset = match self.api.create_ruleset(std::slice::from_ref(&source)).await {
            Ok(ruleset) => ruleset,
            Err(error) => {
                tracing::error!(error = %error, "Failed to create ruleset");
                return DeployOutcome::CreateFailed { error };
            }
        };
        tracing::info!(ruleset = %ruleset.name, "Ruleset created");

        match self.api.release_ruleset(&self.release_id, &ruleset.name).await {
            Ok(release) => {
                tracing::info!(
                    release = %release.name,
                    ruleset = %release.ruleset_name,
                    "Security rules released"
                );
                DeployOutcome::Activated { ruleset, release }
            }
            Err(error) => {
                tracing::error!(
                    ruleset = %ruleset.name,
                    error = %error,
                    "Failed to release ruleset; it was created but is not active"
                );
                DeployOutcome::ReleaseFailed { ruleset, error }
            }
        }
    }
}
