use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted user account.
///
/// `hashed_password` is the encoded hash produced by
/// [`CredentialHasher`](crate::domain::users::auth::CredentialHasher); the
/// plaintext never reaches this type. Neither credential field is serialized
/// or printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct UserRecord {
    /// Store-assigned identity
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("hashed_password", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Insert payload handed to the storage scope; the id is assigned on insert.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("hashed_password", &"<redacted>")
            .finish()
    }
}

/// Partial update for a user record.
///
/// A field that is `None` or empty is treated as "not provided" and leaves
/// the stored value untouched, so a field cannot be cleared through a patch.
#[derive(Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl UserPatch {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn provided_email(&self) -> Option<&str> {
        provided(&self.email)
    }

    pub fn provided_password(&self) -> Option<&str> {
        provided(&self.password)
    }

    pub fn provided_refresh_token(&self) -> Option<&str> {
        provided(&self.refresh_token)
    }

    pub fn is_empty(&self) -> bool {
        self.provided_email().is_none()
            && self.provided_password().is_none()
            && self.provided_refresh_token().is_none()
    }
}

impl fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPatch")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn provided(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}
