// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire models exchanged with the task API.

pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskId};
pub use user::{AuthToken, Credentials, LoginResponse, ProfileResponse, User};

use validator::ValidationError;

/// Reject empty or whitespace-only text fields.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
