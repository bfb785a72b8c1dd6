//! User profile and authentication models.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Authenticated user profile as returned by `/user/getUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier (document `_id`)
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (unique within the store)
    #[serde(default)]
    pub email: String,
}

/// Opaque bearer credential issued by the backend on login.
///
/// Expiry is known only to the backend. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Login request body.
#[derive(Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(custom(function = "crate::models::not_blank"))]
    pub email: String,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Response body of `/user/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
}

/// Response body of `/user/getUser`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}
