// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task model shared by the gateway and the task store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Durable, backend-assigned task identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A task owned by the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Absent until the backend confirms creation
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<TaskId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    /// Assigned by the backend at creation
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task that has not been persisted yet.
    pub fn unsaved(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            completed: false,
            created_at: None,
        }
    }
}

/// Body of `/task/addTask`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewTask {
    #[validate(custom(function = "crate::models::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub description: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_backend_document() {
        let json = r#"{
            "_id": "t1",
            "title": "Buy milk",
            "description": "2%",
            "completed": false,
            "userId": "u1",
            "createdAt": "2026-03-01T10:00:00.000Z",
            "__v": 0
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, Some(TaskId::new("t1")));
        assert_eq!(task.title, "Buy milk");
        assert!(task.created_at.is_some());
    }

    #[test]
    fn test_task_defaults() {
        let task: Task = serde_json::from_str(r#"{"id":"t2","title":"x"}"#).unwrap();
        assert!(!task.completed);
        assert!(task.description.is_empty());
        assert!(task.created_at.is_none());
    }

    #[test]
    fn test_unsaved_task_serializes_without_id() {
        let value = serde_json::to_value(Task::unsaved("a", "b")).unwrap();
        assert!(value.get("_id").is_none());
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn test_new_task_requires_title_and_description() {
        assert!(NewTask::new("Buy milk", "2%").validate().is_ok());
        assert!(NewTask::new("   ", "2%").validate().is_err());
        assert!(NewTask::new("Buy milk", "").validate().is_err());
    }
}
