//! Bootstrap of the administrator account.
//!
//! Two idempotent steps, usually run once per project:
//! - [`reset_admin`] makes sure an Auth account with the given email exists and
//!   has the given password.
//! - [`grant_admin`] makes sure the account's `users/{uid}` profile document
//!   carries `role: admin`.

use crate::client::{ClientError, FirestoreClient, IdentityClient};
use crate::models::*;

/// Collection holding user profile documents.
pub const USERS_COLLECTION: &str = "users";

/// Role written to the profile document.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The account existed; its password was replaced.
    PasswordUpdated { uid: String },
    /// No account used the email; a new one was created.
    Created { uid: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The profile existed; `role` and `email` were overwritten.
    Updated { uid: String },
    /// The profile was missing and has been created.
    Created { uid: String },
    /// No Auth account uses the email. Nothing was written.
    UserNotFound,
}

/// Ensure an account for `email` exists with `password`.
pub async fn reset_admin(
    identity: &IdentityClient<'_>,
    email: &str,
    password: &str,
) -> Result<ResetOutcome, ClientError> {
    match identity.get_user_by_email(email).await? {
        Some(user) => {
            tracing::info!(email, uid = %user.local_id, "User found, updating password");
            identity.update_password(&user.local_id, password).await?;
            Ok(ResetOutcome::PasswordUpdated {
                uid: user.local_id,
            })
        }
        None => {
            tracing::info!(email, "User not found, creating");
            let uid = identity.create_user(email, password).await?;
            Ok(ResetOutcome::Created { uid })
        }
    }
}

/// Ensure the profile document of the account using `email` has the admin role.
pub async fn grant_admin(
    identity: &IdentityClient<'_>,
    firestore: &FirestoreClient<'_>,
    email: &str,
) -> Result<GrantOutcome, ClientError> {
    let Some(user) = identity.get_user_by_email(email).await? else {
        tracing::warn!(email, "User not found in Auth; run reset-admin first");
        return Ok(GrantOutcome::UserNotFound);
    };
    let uid = user.local_id;
    tracing::info!(email, uid = %uid, "Auth user found");

    let path = format!("{}/{}", USERS_COLLECTION, uid);
    let existing = firestore.get_document(&path).await?;
    let write = profile_write(firestore.document_name(&path), email, existing.is_some());

    match existing {
        Some(doc) => {
            tracing::info!(
                uid = %uid,
                role = doc.string_field("role").unwrap_or("<none>"),
                "Profile document exists, setting admin role"
            );
            firestore.commit(vec![write]).await?;
            Ok(GrantOutcome::Updated { uid })
        }
        None => {
            tracing::info!(uid = %uid, "Profile document missing, creating it");
            firestore.commit(vec![write]).await?;
            Ok(GrantOutcome::Created { uid })
        }
    }
}

/// Write that grants the admin role.
///
/// Existing documents only get `role` and `email` touched, and the write fails
/// with `NOT_FOUND` if the document was deleted since it was read. New
/// documents also receive a server-side `createdAt` timestamp.
fn profile_write(document_name: String, email: &str, exists: bool) -> Write {
    let mut update = Document {
        name: document_name,
        ..Default::default()
    };
    update
        .fields
        .insert("email".to_string(), Value::string(email));
    update
        .fields
        .insert("role".to_string(), Value::string(ADMIN_ROLE));

    if exists {
        Write {
            update,
            update_mask: Some(DocumentMask {
                field_paths: vec!["email".to_string(), "role".to_string()],
            }),
            update_transforms: vec![],
            current_document: Some(Precondition { exists: true }),
        }
    } else {
        Write {
            update,
            update_mask: None,
            update_transforms: vec![FieldTransform::request_time("createdAt")],
            current_document: None,
        }
    }
}
