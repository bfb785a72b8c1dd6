// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync gateway: the only component that talks to the task API.
//!
//! Handles:
//! - Login and profile lookup
//! - Task listing, creation, removal and completion updates
//! - Mapping HTTP failures onto [`AppError`]
//!
//! Every call is a single round trip. There are no retries; callers own any
//! rollback of local state.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AuthToken, Credentials, LoginResponse, NewTask, ProfileResponse, Task, TaskId, User,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

/// Outcome of a create call.
///
/// Some backends answer `/task/addTask` with the stored document, others with
/// a bare acknowledgement. Only the former carries the new task's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    Task(Task),
    Acknowledged,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Wrapped { task: Task },
    Bare(Task),
    Ack(serde_json::Value),
}

#[derive(Serialize)]
struct RemoveTaskBody<'a> {
    id: &'a TaskId,
}

#[derive(Serialize)]
struct UpdateTaskBody<'a> {
    id: &'a TaskId,
    completed: bool,
}

/// Task API client.
#[derive(Clone)]
pub struct SyncGateway {
    http: reqwest::Client,
    base_url: String,
}

impl SyncGateway {
    /// Create a gateway for the configured API root.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session token.
    ///
    /// Blank credentials are rejected as `InvalidCredentials` without a request.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken> {
        credentials
            .validate()
            .map_err(|_| AppError::InvalidCredentials)?;

        let url = self.url("/user/login");
        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(
            method = "POST",
            path = "/user/login",
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Task API call"
        );

        if !status.is_success() {
            let message = error_message(response).await;
            return Err(AppError::from_login_status(status, message));
        }

        let body: LoginResponse = response.json().await?;
        if body.token.as_str().is_empty() {
            return Err(AppError::Decode("login response carried an empty token".to_string()));
        }
        Ok(body.token)
    }

    /// Get the profile of the token's owner.
    pub async fn fetch_profile(&self, token: &AuthToken) -> Result<User> {
        let body: ProfileResponse = self.get_json("/user/getUser", token).await?;
        Ok(body.user)
    }

    /// Get the authoritative task list for the token's owner.
    ///
    /// An empty list is a valid answer.
    pub async fn fetch_tasks(&self, token: &AuthToken) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self.get_json("/task/getTask", token).await?;
        if tasks.iter().any(|t| t.id.is_none()) {
            return Err(AppError::Decode("task list contains a task without _id".to_string()));
        }
        Ok(tasks)
    }

    /// Create a task. Blank fields fail before any request is sent.
    pub async fn create_task(&self, token: &AuthToken, new_task: &NewTask) -> Result<Created> {
        new_task.validate()?;

        let created = match self
            .post_json::<_, CreateResponse>("/task/addTask", token, new_task)
            .await?
        {
            CreateResponse::Wrapped { task } | CreateResponse::Bare(task) if task.id.is_some() => {
                Created::Task(task)
            }
            _ => Created::Acknowledged,
        };
        Ok(created)
    }

    /// Delete a task. `NotFound` if it does not exist or belongs to someone else.
    pub async fn delete_task(&self, token: &AuthToken, id: &TaskId) -> Result<()> {
        self.post_ack("/task/removeTask", token, &RemoveTaskBody { id })
            .await
    }

    /// Persist a task's completion flag.
    pub async fn update_completion(
        &self,
        token: &AuthToken,
        id: &TaskId,
        completed: bool,
    ) -> Result<()> {
        self.post_ack("/task/updateTask", token, &UpdateTaskBody { id, completed })
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &AuthToken) -> Result<T> {
        require_token(token)?;
        let started = Instant::now();
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        log_call("GET", path, &response, started);
        check_response_json(response).await
    }

    /// Generic POST request with JSON body and JSON response.
    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AuthToken,
        body: &B,
    ) -> Result<T> {
        let response = self.post(path, token, body).await?;
        check_response_json(response).await
    }

    /// POST request where only the status matters.
    async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &AuthToken,
        body: &B,
    ) -> Result<()> {
        let response = self.post(path, token, body).await?;
        check_response(response).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &AuthToken,
        body: &B,
    ) -> Result<reqwest::Response> {
        require_token(token)?;
        let started = Instant::now();
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        log_call("POST", path, &response, started);
        Ok(response)
    }
}

/// Fail closed on a token that cannot possibly authenticate.
fn require_token(token: &AuthToken) -> Result<()> {
    if token.as_str().trim().is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}

fn log_call(method: &'static str, path: &str, response: &reqwest::Response, started: Instant) {
    tracing::debug!(
        method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Task API call"
    );
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(status_error(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Decode(format!("JSON parse error: {}", e)))
}

async fn status_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let message = error_message(response).await;
    if status.is_server_error() {
        tracing::warn!(status = status.as_u16(), message = %message, "Task API server error");
    }
    AppError::from_status(status, message)
}

/// Pull a human-readable message out of an error response.
///
/// The backend usually answers `{ "message": "..." }`; anything else is
/// passed through as text.
async fn error_message(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error")]
        message: String,
    }

    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body)
}
