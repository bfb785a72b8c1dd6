// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure transition function for the task list.
//!
//! Every action addresses tasks by identity: a backend [`TaskId`] for stored
//! tasks, a [`PendingKey`] for a create that has not been confirmed yet.
//! Actions that reference an entry which is no longer present are no-ops, so
//! late responses can be applied without checking first.
//!
//! The reducer never invents or rewrites `id` or `created_at`; those only ever
//! arrive from the backend through `SetTasks`, `AddTask` or `ConfirmPending`.

use crate::models::{Task, TaskId};

/// Client-local handle for a created task that has no backend id yet.
pub type PendingKey = u64;

/// Synchronization status of a task entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Matches what the backend last confirmed.
    Confirmed,
    /// Create sent, waiting for the backend to assign an id.
    PendingCreate(PendingKey),
    /// Delete sent; the entry stays visible until the backend confirms.
    PendingRemove,
    /// Completion flip sent; `completed` already shows the new value.
    PendingToggle,
}

impl SyncStatus {
    pub fn is_pending(&self) -> bool {
        !matches!(self, SyncStatus::Confirmed)
    }
}

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub task: Task,
    pub status: SyncStatus,
}

impl TaskEntry {
    pub fn confirmed(task: Task) -> Self {
        Self {
            task,
            status: SyncStatus::Confirmed,
        }
    }

    pub fn id(&self) -> Option<&TaskId> {
        self.task.id.as_ref()
    }

    fn has_id(&self, id: &TaskId) -> bool {
        self.task.id.as_ref() == Some(id)
    }

    fn has_pending_key(&self, key: PendingKey) -> bool {
        self.status == SyncStatus::PendingCreate(key)
    }
}

/// Task list transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Replace the list with the backend's, in backend order. Creates still in
    /// flight are kept at the end.
    SetTasks(Vec<Task>),
    /// Append a task the backend has already stored.
    AddTask(Task),
    /// Append a tentative task awaiting backend confirmation.
    AddPending {
        key: PendingKey,
        title: String,
        description: String,
    },
    /// Promote a tentative task to the stored copy returned by the backend.
    ConfirmPending { key: PendingKey, task: Task },
    /// Drop a tentative task whose create failed.
    DiscardPending { key: PendingKey },
    /// Tag a task as being deleted.
    MarkRemoving(TaskId),
    /// Remove a task the backend has deleted.
    RemoveTask(TaskId),
    /// Flip `completed`.
    MarkDone(TaskId),
    /// Flip `completed` and tag the entry until the backend confirms.
    MarkToggling(TaskId),
    /// Undo a `MarkToggling` the backend rejected.
    RollbackToggle(TaskId),
    /// Settle a pending remove or toggle back to `Confirmed`.
    ClearPending(TaskId),
    /// Drop everything (session change).
    Clear,
}

/// Apply `action` to `tasks`, returning the new list.
pub fn reduce(mut tasks: Vec<TaskEntry>, action: TaskAction) -> Vec<TaskEntry> {
    match action {
        TaskAction::SetTasks(fresh) => {
            let mut next: Vec<TaskEntry> = fresh
                .into_iter()
                .map(|task| {
                    let mut entry = TaskEntry::confirmed(task);
                    // The fetch may predate a remove or toggle still in flight.
                    let pending = entry.id().and_then(|id| {
                        tasks.iter().find(|e| {
                            e.has_id(id)
                                && matches!(
                                    e.status,
                                    SyncStatus::PendingRemove | SyncStatus::PendingToggle
                                )
                        })
                    });
                    if let Some(local) = pending {
                        if local.status == SyncStatus::PendingToggle {
                            entry.task.completed = local.task.completed;
                        }
                        entry.status = local.status;
                    }
                    entry
                })
                .collect();
            next.extend(
                tasks
                    .into_iter()
                    .filter(|e| matches!(e.status, SyncStatus::PendingCreate(_))),
            );
            next
        }
        TaskAction::AddTask(task) => {
            if task.id.as_ref().is_some_and(|id| tasks.iter().any(|e| e.has_id(id))) {
                return tasks;
            }
            tasks.push(TaskEntry::confirmed(task));
            tasks
        }
        TaskAction::AddPending {
            key,
            title,
            description,
        } => {
            tasks.push(TaskEntry {
                task: Task::unsaved(title, description),
                status: SyncStatus::PendingCreate(key),
            });
            tasks
        }
        TaskAction::ConfirmPending { key, task } => {
            let Some(pos) = tasks.iter().position(|e| e.has_pending_key(key)) else {
                return tasks;
            };
            // A full fetch may already have delivered the stored copy.
            let already_listed = task
                .id
                .as_ref()
                .is_some_and(|id| tasks.iter().any(|e| e.has_id(id)));
            if already_listed {
                tasks.remove(pos);
            } else {
                tasks[pos] = TaskEntry::confirmed(task);
            }
            tasks
        }
        TaskAction::DiscardPending { key } => {
            tasks.retain(|e| !e.has_pending_key(key));
            tasks
        }
        TaskAction::MarkRemoving(id) => {
            if let Some(entry) = tasks.iter_mut().find(|e| e.has_id(&id)) {
                entry.status = SyncStatus::PendingRemove;
            }
            tasks
        }
        TaskAction::RemoveTask(id) => {
            if let Some(pos) = tasks.iter().position(|e| e.has_id(&id)) {
                tasks.remove(pos);
            }
            tasks
        }
        TaskAction::MarkDone(id) => {
            if let Some(entry) = tasks.iter_mut().find(|e| e.has_id(&id)) {
                entry.task.completed = !entry.task.completed;
            }
            tasks
        }
        TaskAction::MarkToggling(id) => {
            if let Some(entry) = tasks.iter_mut().find(|e| e.has_id(&id)) {
                entry.task.completed = !entry.task.completed;
                entry.status = SyncStatus::PendingToggle;
            }
            tasks
        }
        TaskAction::RollbackToggle(id) => {
            if let Some(entry) = tasks
                .iter_mut()
                .find(|e| e.has_id(&id) && e.status == SyncStatus::PendingToggle)
            {
                entry.task.completed = !entry.task.completed;
                entry.status = SyncStatus::Confirmed;
            }
            tasks
        }
        TaskAction::ClearPending(id) => {
            if let Some(entry) = tasks.iter_mut().find(|e| {
                e.has_id(&id)
                    && matches!(e.status, SyncStatus::PendingRemove | SyncStatus::PendingToggle)
            }) {
                entry.status = SyncStatus::Confirmed;
            }
            tasks
        }
        TaskAction::Clear => Vec::new(),
    }
}
