//! Authenticated session shared by every remote call of one invocation.

use reqwest::{Client, Method, RequestBuilder};
use tokio::sync::OnceCell;

use crate::auth::{self, AuthError};
use crate::client::ClientError;
use crate::credentials::ServiceAccountKey;

pub const DEFAULT_RULES_URL: &str = "https://firebaserules.googleapis.com/v1";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Base URLs of the Google APIs. Overridable for emulators and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rules: String,
    pub identity: String,
    pub firestore: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES_URL.to_string(),
            identity: DEFAULT_IDENTITY_URL.to_string(),
            firestore: DEFAULT_FIRESTORE_URL.to_string(),
        }
    }
}

/// Credential, HTTP client and cached access token for one invocation.
///
/// Built once at startup and handed by reference to every client.
pub struct Session {
    key: ServiceAccountKey,
    endpoints: Endpoints,
    http: Client,
    token: OnceCell<String>,
}

impl Session {
    pub fn new(key: ServiceAccountKey, endpoints: Endpoints) -> Self {
        Self {
            key,
            endpoints,
            http: Client::new(),
            token: OnceCell::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Access token, fetched on first use and reused afterwards.
    pub async fn access_token(&self) -> Result<&str, AuthError> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let token = auth::fetch_access_token(&self.http, &self.key).await?;
                tracing::debug!(expires_in = ?token.expires_in, "Obtained access token");
                Ok::<_, AuthError>(token.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    /// Build an authorized request against an absolute URL.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
    ) -> Result<RequestBuilder, ClientError> {
        let token = self.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}
