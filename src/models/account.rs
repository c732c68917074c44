use serde::{Deserialize, Serialize};

/// A Firebase Auth account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// The user's uid.
    pub local_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body of `accounts:lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupUsersInput {
    pub email: Vec<String>,
}

/// Response of `accounts:lookup`. The `users` field is absent when nothing matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupUsersResponse {
    #[serde(default)]
    pub users: Vec<AuthUser>,
}

/// Body of account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
}

/// Body of `accounts:update` for a password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordInput {
    pub local_id: String,
    pub password: String,
}

/// Minimal response of account create/update calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub local_id: String,
}
