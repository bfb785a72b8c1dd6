// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory task list for the current session.
//!
//! The store is a thin shell around [`reduce`]: all changes go through
//! [`TaskStore::dispatch`], and every change is published to subscribers.
//!
//! Each snapshot carries the session generation it belongs to. Responses
//! captured under an older generation are dropped by
//! [`TaskStore::dispatch_if_current`], so a logout mid-flight cannot leak a
//! previous user's task into the next session.

use crate::models::{Task, TaskId};
use crate::state::reducer::{reduce, PendingKey, TaskAction, TaskEntry};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Published state of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// Session generation the entries belong to
    pub epoch: u64,
    pub entries: Vec<TaskEntry>,
}

/// Ordered task list shared by the intent layer and the view.
pub struct TaskStore {
    state: watch::Sender<TaskSnapshot>,
    next_key: AtomicU64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TaskSnapshot::default());
        Self {
            state,
            next_key: AtomicU64::new(1),
        }
    }

    /// Apply an action unconditionally.
    pub fn dispatch(&self, action: TaskAction) {
        self.state.send_modify(|snapshot| {
            let entries = std::mem::take(&mut snapshot.entries);
            snapshot.entries = reduce(entries, action);
        });
    }

    /// Apply an action only if the list still belongs to session `epoch`.
    ///
    /// Returns false when the action was dropped as stale.
    pub fn dispatch_if_current(&self, epoch: u64, action: TaskAction) -> bool {
        self.state.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch {
                return false;
            }
            let entries = std::mem::take(&mut snapshot.entries);
            snapshot.entries = reduce(entries, action);
            true
        })
    }

    /// Attach the list to session `epoch`, clearing it if it belonged to
    /// another session. Returns true if the list was cleared.
    pub fn bind(&self, epoch: u64) -> bool {
        let cleared = self.state.send_if_modified(|snapshot| {
            if snapshot.epoch == epoch {
                return false;
            }
            snapshot.epoch = epoch;
            snapshot.entries = reduce(std::mem::take(&mut snapshot.entries), TaskAction::Clear);
            true
        });
        if cleared {
            tracing::debug!(epoch, "Task list cleared for new session");
        }
        cleared
    }

    /// Drop every entry without changing the session binding.
    pub fn reset(&self) {
        self.dispatch(TaskAction::Clear);
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.state.borrow().clone()
    }

    pub fn entries(&self) -> Vec<TaskEntry> {
        self.state.borrow().entries.clone()
    }

    /// Visible tasks, including ones still waiting on the backend.
    pub fn tasks(&self) -> Vec<Task> {
        self.state
            .borrow()
            .entries
            .iter()
            .map(|e| e.task.clone())
            .collect()
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskEntry> {
        self.state
            .borrow()
            .entries
            .iter()
            .find(|e| e.id() == Some(id))
            .cloned()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.state
            .borrow()
            .entries
            .iter()
            .any(|e| e.id() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh handle for a tentative create.
    pub fn next_pending_key(&self) -> PendingKey {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.state.subscribe()
    }
}
