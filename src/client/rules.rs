use reqwest::Method;

use super::{handle_optional_response, handle_response, ClientError};
use crate::models::*;
use crate::session::Session;

/// Client for the Firebase Rules API.
#[derive(Clone, Copy)]
pub struct RulesClient<'a> {
    session: &'a Session,
}

impl<'a> RulesClient<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}{}",
            self.session.endpoints().rules,
            self.session.project_id(),
            path
        )
    }

    /// Full resource name of a release in this project.
    pub fn release_name(&self, release_id: &str) -> String {
        format!(
            "projects/{}/releases/{}",
            self.session.project_id(),
            release_id
        )
    }

    /// Create a new ruleset from the given source files.
    pub async fn create_ruleset(&self, files: &[RulesSource]) -> Result<Ruleset, ClientError> {
        let input = CreateRulesetInput {
            source: Source {
                files: files.to_vec(),
            },
        };
        let response = self
            .session
            .request(Method::POST, &self.url("/rulesets"))
            .await?
            .json(&input)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Get a release, or `None` if it has never been created.
    pub async fn get_release(&self, release_id: &str) -> Result<Option<Release>, ClientError> {
        let response = self
            .session
            .request(Method::GET, &self.url(&format!("/releases/{}", release_id)))
            .await?
            .send()
            .await?;
        handle_optional_response(response).await
    }

    /// Repoint an existing release.
    pub async fn update_release(
        &self,
        release_id: &str,
        ruleset_name: &str,
    ) -> Result<Release, ClientError> {
        let input = UpdateReleaseInput {
            release: Release::new(self.release_name(release_id), ruleset_name),
        };
        let response = self
            .session
            .request(
                Method::PATCH,
                &self.url(&format!("/releases/{}", release_id)),
            )
            .await?
            .json(&input)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Create a release that does not exist yet.
    pub async fn create_release(
        &self,
        release_id: &str,
        ruleset_name: &str,
    ) -> Result<Release, ClientError> {
        let input = Release::new(self.release_name(release_id), ruleset_name);
        let response = self
            .session
            .request(Method::POST, &self.url("/releases"))
            .await?
            .json(&input)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Bind a release to a ruleset, creating the release on first deployment.
    pub async fn release_ruleset(
        &self,
        release_id: &str,
        ruleset_name: &str,
    ) -> Result<Release, ClientError> {
        match self.update_release(release_id, ruleset_name).await {
            Err(e) if e.is_not_found() => {
                tracing::info!(release = %release_id, "Release does not exist yet, creating it");
                self.create_release(release_id, ruleset_name).await
            }
            other => other,
        }
    }
}
