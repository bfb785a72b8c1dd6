// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intent layer: turns user actions into gateway calls and store transitions.
//!
//! Every task intent follows the same shape:
//! 1. Snapshot the token and session generation (no token: `Unauthenticated`,
//!    nothing is sent)
//! 2. Tag the affected entry as pending
//! 3. Make exactly one gateway call with the snapshotted token
//! 4. On success commit, on failure roll the tag back
//! 5. On `Unauthenticated`, end the session if that token is still current
//!
//! Results are applied only while the task list still belongs to the
//! snapshotted generation.

use crate::config::{CompletionSync, Config};
use crate::error::{AppError, Result};
use crate::models::{AuthToken, Credentials, NewTask, Task, TaskId, User};
use crate::services::{Created, SyncGateway, TokenSlot};
use crate::state::{TaskAction, TaskEntry, TaskStore, TokenStore};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

/// Per-task mutex map so that at most one mutation per task is in flight.
pub type TaskLocks = DashMap<TaskId, Arc<Mutex<()>>>;

/// Session-scoped task client.
pub struct TaskClient {
    gateway: SyncGateway,
    session: TokenStore,
    tasks: TaskStore,
    completion_sync: CompletionSync,
    task_locks: TaskLocks,
}

impl TaskClient {
    pub fn new(config: &Config, slot: Arc<dyn TokenSlot>) -> Result<Self> {
        Ok(Self {
            gateway: SyncGateway::new(config)?,
            session: TokenStore::new(slot),
            tasks: TaskStore::new(),
            completion_sync: config.completion_sync,
            task_locks: DashMap::new(),
        })
    }

    pub fn session(&self) -> &TokenStore {
        &self.session
    }

    /// The task list, cleared first if the session has changed since it was filled.
    pub fn tasks(&self) -> &TaskStore {
        self.align();
        &self.tasks
    }

    pub fn entries(&self) -> Vec<TaskEntry> {
        self.tasks().entries()
    }

    pub fn completion_sync(&self) -> CompletionSync {
        self.completion_sync
    }

    // ─── Session ─────────────────────────────────────────────────

    /// Resume a saved session and load its tasks.
    pub async fn restore(&self) -> Result<Option<User>> {
        let restored = self.session.restore_from_persistence(&self.gateway).await;
        self.align();
        let user = restored?;
        if self.session.current_token().is_some() {
            self.refresh().await?;
        }
        Ok(user)
    }

    /// Log in, then load the new user's tasks.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        let user = self.session.login(&self.gateway, credentials).await?;
        self.align();
        match self.refresh().await {
            Ok(count) => {
                tracing::debug!(count, "Loaded tasks after login");
                Ok(user)
            }
            Err(e) if e.is_unauthenticated() => Err(e),
            Err(e) => {
                // The session is valid; the list can be refreshed later.
                tracing::warn!(error = %e, "Could not load tasks after login");
                Ok(user)
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
        self.align();
    }

    // ─── Tasks ───────────────────────────────────────────────────

    /// Replace the local list with the backend's. Returns the task count.
    pub async fn refresh(&self) -> Result<usize> {
        let (token, generation) = self.authorize()?;
        let result = self.gateway.fetch_tasks(&token).await;
        let tasks = self.settle(&token, result)?;
        let count = tasks.len();

        if !self
            .tasks
            .dispatch_if_current(generation, TaskAction::SetTasks(tasks))
        {
            tracing::debug!("Dropping task list fetched for a previous session");
        }
        Ok(count)
    }

    /// Create a task. It shows up as pending right away and is replaced by
    /// the stored copy once the backend confirms.
    pub async fn add_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task> {
        let (token, generation) = self.authorize()?;
        let new_task = NewTask::new(title, description);
        new_task.validate()?;

        let key = self.tasks.next_pending_key();
        self.tasks.dispatch_if_current(
            generation,
            TaskAction::AddPending {
                key,
                title: new_task.title.clone(),
                description: new_task.description.clone(),
            },
        );

        let result = self.gateway.create_task(&token, &new_task).await;
        match self.settle(&token, result) {
            Ok(Created::Task(task)) => {
                self.tasks.dispatch_if_current(
                    generation,
                    TaskAction::ConfirmPending {
                        key,
                        task: task.clone(),
                    },
                );
                tracing::info!(task_id = ?task.id, "Task created");
                Ok(task)
            }
            Ok(Created::Acknowledged) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::DiscardPending { key });
                self.reconcile_created(&token, generation, &new_task).await
            }
            Err(e) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::DiscardPending { key });
                tracing::info!(error = %e, "Task create failed");
                Err(e)
            }
        }
    }

    /// Delete a task. It stays visible, tagged pending, until the backend confirms.
    pub async fn remove_task(&self, id: &TaskId) -> Result<()> {
        let (token, generation) = self.authorize()?;
        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.remove_locked(id, &token, generation).await
        };
        self.release_lock(id, lock);
        result
    }

    async fn remove_locked(&self, id: &TaskId, token: &AuthToken, generation: u64) -> Result<()> {
        self.recheck(id, generation)?;

        self.tasks
            .dispatch_if_current(generation, TaskAction::MarkRemoving(id.clone()));

        let result = self.gateway.delete_task(token, id).await;
        match self.settle(token, result) {
            Ok(()) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::RemoveTask(id.clone()));
                tracing::info!(task_id = %id, "Task removed");
                Ok(())
            }
            Err(e) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::ClearPending(id.clone()));
                tracing::info!(task_id = %id, error = %e, "Task remove failed");
                Err(e)
            }
        }
    }

    /// Flip a task's completion flag. Returns the new value.
    pub async fn toggle_task(&self, id: &TaskId) -> Result<bool> {
        let (token, generation) = self.authorize()?;
        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.toggle_locked(id, &token, generation).await
        };
        self.release_lock(id, lock);
        result
    }

    async fn toggle_locked(&self, id: &TaskId, token: &AuthToken, generation: u64) -> Result<bool> {
        let completed = !self.recheck(id, generation)?.task.completed;

        if self.completion_sync == CompletionSync::Local {
            self.tasks
                .dispatch_if_current(generation, TaskAction::MarkDone(id.clone()));
            return Ok(completed);
        }

        self.tasks
            .dispatch_if_current(generation, TaskAction::MarkToggling(id.clone()));

        let result = self.gateway.update_completion(token, id, completed).await;
        match self.settle(token, result) {
            Ok(()) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::ClearPending(id.clone()));
                Ok(completed)
            }
            Err(e) => {
                self.tasks
                    .dispatch_if_current(generation, TaskAction::RollbackToggle(id.clone()));
                tracing::info!(task_id = %id, error = %e, "Task toggle failed");
                Err(e)
            }
        }
    }

    // ─── Helpers ─────────────────────────────────────────────────

    /// Keep the task list tied to the current session.
    fn align(&self) {
        if self.tasks.bind(self.session.generation()) {
            self.task_locks.clear();
        }
    }

    /// Snapshot the token for one call. Fails closed without a token.
    fn authorize(&self) -> Result<(AuthToken, u64)> {
        self.align();
        let snapshot = self.session.snapshot();
        let token = snapshot.token.ok_or(AppError::Unauthenticated)?;
        Ok((token, snapshot.generation))
    }

    /// Apply session-wide consequences of a call result.
    fn settle<T>(&self, token: &AuthToken, result: Result<T>) -> Result<T> {
        if let Err(AppError::Unauthenticated) = &result {
            if self.session.invalidate(token) {
                self.align();
            }
        }
        result
    }

    fn task_lock(&self, id: &TaskId) -> Arc<Mutex<()>> {
        self.task_locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the lock for `id` unless another intent is holding or waiting on it.
    fn release_lock(&self, id: &TaskId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.task_locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// After waiting for the task lock, make sure the target still exists in
    /// the same session.
    fn recheck(&self, id: &TaskId, generation: u64) -> Result<TaskEntry> {
        self.align();
        let entry = if self.tasks.epoch() == generation {
            self.tasks.get(id)
        } else {
            None
        };
        entry.ok_or_else(|| AppError::NotFound(format!("Task {}", id)))
    }

    /// The backend stored the task but did not say under which id; find it
    /// in a fresh listing.
    async fn reconcile_created(
        &self,
        token: &AuthToken,
        generation: u64,
        new_task: &NewTask,
    ) -> Result<Task> {
        let known: HashSet<TaskId> = self
            .tasks
            .entries()
            .iter()
            .filter_map(|e| e.id().cloned())
            .collect();

        let result = self.gateway.fetch_tasks(token).await;
        let tasks = self.settle(token, result)?;

        let created = tasks
            .iter()
            .rev()
            .find(|t| {
                t.id.as_ref().is_some_and(|id| !known.contains(id))
                    && t.title == new_task.title
                    && t.description == new_task.description
            })
            .cloned();

        self.tasks
            .dispatch_if_current(generation, TaskAction::SetTasks(tasks));

        created.ok_or_else(|| {
            AppError::Decode("created task missing from the task list".to_string())
        })
    }
}
