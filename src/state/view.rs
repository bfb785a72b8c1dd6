//! Display helpers: filtered lists, badge counts and position lookup.
//!
//! Positions only exist here. Anything that mutates the list gets a
//! [`TaskId`] from [`id_at`] first.

use crate::models::TaskId;
use crate::state::reducer::TaskEntry;
use std::fmt;
use std::str::FromStr;

/// Which subset of the list is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, entry: &TaskEntry) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !entry.task.completed,
            TaskFilter::Completed => entry.task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        })
    }
}

/// Entries visible under `filter`, in list order.
pub fn filtered(entries: &[TaskEntry], filter: TaskFilter) -> Vec<&TaskEntry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

/// Identity of the entry shown at zero-based `position` under `filter`.
///
/// `None` if the position is out of range or the entry has no backend id yet.
pub fn id_at(entries: &[TaskEntry], filter: TaskFilter, position: usize) -> Option<TaskId> {
    entries
        .iter()
        .filter(|e| filter.matches(e))
        .nth(position)
        .and_then(|e| e.id().cloned())
}

/// Badge counts for the filter tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

pub fn counts(entries: &[TaskEntry]) -> TaskCounts {
    let completed = entries.iter().filter(|e| e.task.completed).count();
    TaskCounts {
        all: entries.len(),
        active: entries.len() - completed,
        completed,
    }
}
