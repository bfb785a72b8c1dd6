// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy shared by the gateway, the stores and the intent layer.

use reqwest::StatusCode;

/// Application error type surfaced to the view layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No token, or the backend rejected the token. Forces session teardown.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport-level failure: no HTTP response was received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Returns true if this error must end the current session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AppError::Unauthenticated)
    }

    /// Returns true for failures where trying again later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Server { .. })
    }

    /// Map a non-success HTTP status from a task or profile call.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 | 422 => AppError::Validation(message),
            401 | 403 => AppError::Unauthenticated,
            404 => AppError::NotFound(message),
            code => AppError::Server {
                status: code,
                message,
            },
        }
    }

    /// Map a non-success HTTP status from the login call.
    ///
    /// The backend answers unknown users and bad passwords with 4xx codes
    /// that all mean the same thing to the caller.
    pub fn from_login_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 | 401 | 403 | 404 => AppError::InvalidCredentials,
            _ => Self::from_status(status, message),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();
        AppError::Validation(format!("{} must not be empty", fields.join(" and ")))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AppError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            AppError::Validation(_)
        ));
        assert!(AppError::from_status(StatusCode::UNAUTHORIZED, String::new()).is_unauthenticated());
        assert!(AppError::from_status(StatusCode::FORBIDDEN, String::new()).is_unauthenticated());
        assert!(matches!(
            AppError::from_status(StatusCode::NOT_FOUND, "t1".into()),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            AppError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn test_login_status_mapping() {
        assert!(matches!(
            AppError::from_login_status(StatusCode::BAD_REQUEST, String::new()),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from_login_status(StatusCode::NOT_FOUND, String::new()),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from_login_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            AppError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn test_validation_errors_name_blank_fields() {
        use crate::models::NewTask;
        use validator::Validate;

        let err: AppError = NewTask::new(" ", "").validate().unwrap_err().into();
        match err {
            AppError::Validation(message) => {
                assert_eq!(message, "description and title must not be empty")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err: AppError = NewTask::new("Buy milk", "").validate().unwrap_err().into();
        assert_eq!(err.to_string(), "Invalid request: description must not be empty");
    }

    #[test]
    fn test_transient() {
        assert!(AppError::Network("reset".into()).is_transient());
        assert!(!AppError::Validation("title".into()).is_transient());
        assert!(!AppError::Unauthenticated.is_transient());
    }
}
