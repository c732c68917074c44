use reqwest::Method;

use super::{handle_optional_response, handle_response, ClientError};
use crate::models::*;
use crate::session::Session;

/// Client for the Firestore REST API, scoped to one database.
#[derive(Clone)]
pub struct FirestoreClient<'a> {
    session: &'a Session,
    database: String,
}

impl<'a> FirestoreClient<'a> {
    pub fn new(session: &'a Session, database: impl Into<String>) -> Self {
        Self {
            session,
            database: database.into(),
        }
    }

    /// Resource name of the database's document root.
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.session.project_id(),
            self.database
        )
    }

    /// Full resource name of a document, e.g. `users/abc`.
    pub fn document_name(&self, path: &str) -> String {
        format!("{}/{}", self.documents_root(), path)
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.session.endpoints().firestore, resource)
    }

    /// Fetch a document, or `None` if it does not exist.
    pub async fn get_document(&self, path: &str) -> Result<Option<Document>, ClientError> {
        let response = self
            .session
            .request(Method::GET, &self.url(&self.document_name(path)))
            .await?
            .send()
            .await?;
        handle_optional_response(response).await
    }

    /// Apply writes atomically.
    pub async fn commit(&self, writes: Vec<Write>) -> Result<CommitResponse, ClientError> {
        let input = CommitInput { writes };
        let response = self
            .session
            .request(
                Method::POST,
                &self.url(&format!("{}:commit", self.documents_root())),
            )
            .await?
            .json(&input)
            .send()
            .await?;
        handle_response(response).await
    }
}
