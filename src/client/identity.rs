use reqwest::Method;

use super::{handle_response, ClientError};
use crate::models::*;
use crate::session::Session;

/// Client for the Identity Toolkit (Firebase Auth admin) API.
#[derive(Clone, Copy)]
pub struct IdentityClient<'a> {
    session: &'a Session,
}

impl<'a> IdentityClient<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}{}",
            self.session.endpoints().identity,
            self.session.project_id(),
            path
        )
    }

    /// Find a user by email. Returns `None` when no account uses it.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ClientError> {
        let input = LookupUsersInput {
            email: vec![email.to_string()],
        };
        let response = self
            .session
            .request(Method::POST, &self.url("/accounts:lookup"))
            .await?
            .json(&input)
            .send()
            .await?;
        let found: LookupUsersResponse = handle_response(response).await?;
        Ok(found.users.into_iter().next())
    }

    /// Create an email/password account.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let input = CreateUserInput {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .session
            .request(Method::POST, &self.url("/accounts"))
            .await?
            .json(&input)
            .send()
            .await?;
        let created: AccountResponse = handle_response(response).await?;
        Ok(created.local_id)
    }

    /// Replace the password of an existing account.
    pub async fn update_password(&self, uid: &str, password: &str) -> Result<(), ClientError> {
        let input = UpdatePasswordInput {
            local_id: uid.to_string(),
            password: password.to_string(),
        };
        let response = self
            .session
            .request(Method::POST, &self.url("/accounts:update"))
            .await?
            .json(&input)
            .send()
            .await?;
        let _: AccountResponse = handle_response(response).await?;
        Ok(())
    }
}
