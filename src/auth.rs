//! OAuth2 access tokens for a service account (JWT bearer grant, RFC 7523).

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::{CredentialsError, ServiceAccountKey};

/// Scopes requested for every token. `cloud-platform` covers the Rules,
/// Identity Toolkit and Firestore APIs.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/firebase",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of the signed assertion. Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Token exchange errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid private key: {0}")]
    Key(#[from] CredentialsError),

    #[error("failed to sign assertion: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint rejected the grant ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Build the RS256 assertion for a key.
pub fn sign_assertion(key: &ServiceAccountKey) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        sub: key.client_email.clone(),
        aud: key.token_uri.clone(),
        scope: SCOPES.join(" "),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = key.encoding_key()?;
    encode(&header, &claims, &encoding_key).map_err(AuthError::Sign)
}

/// Exchange a signed assertion for an access token.
pub async fn fetch_access_token(
    client: &Client,
    key: &ServiceAccountKey,
) -> Result<AccessToken, AuthError> {
    let assertion = sign_assertion(key)?;

    tracing::debug!(token_uri = %key.token_uri, "Requesting access token");
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
