//! Service account key loading.
//!
//! The key file is the JSON document downloaded from the Google Cloud console
//! (`IAM & Admin > Service Accounts > Keys`). Only the fields needed to mint
//! access tokens are read; everything else is ignored.

use std::fmt;
use std::fs;
use std::path::Path;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Deserialize;
use thiserror::Error;

/// Default OAuth2 token endpoint for Google service accounts.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Errors that can occur while loading credential material.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credentials: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid credentials: {0}")]
    Invalid(String),
}

/// Service account key material.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// The private key never goes to logs.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Load and validate a key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), CredentialsError> {
        if self.key_type != "service_account" {
            return Err(CredentialsError::Invalid(format!(
                "expected type 'service_account', got '{}'",
                self.key_type
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(CredentialsError::Invalid("project_id is empty".to_string()));
        }
        if self.client_email.trim().is_empty() {
            return Err(CredentialsError::Invalid("client_email is empty".to_string()));
        }
        self.encoding_key()?;
        Ok(())
    }

    /// RS256 signing key parsed from `private_key`.
    ///
    /// The PEM envelope alone does not prove the key is usable, so a throwaway
    /// claim set is signed with it before it is returned.
    pub fn encoding_key(&self) -> Result<EncodingKey, CredentialsError> {
        let unusable = |e: jsonwebtoken::errors::Error| {
            CredentialsError::Invalid(format!("private_key is not a usable RSA key: {}", e))
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(unusable)?;
        encode(
            &Header::new(Algorithm::RS256),
            &serde_json::json!({ "iss": self.client_email }),
            &key,
        )
        .map_err(unusable)?;
        Ok(key)
    }
}
