// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session and task state.

pub mod reducer;
pub mod session;
pub mod tasks;
pub mod view;

pub use reducer::{reduce, PendingKey, SyncStatus, TaskAction, TaskEntry};
pub use session::{SessionSnapshot, SessionState, TokenStore};
pub use tasks::{TaskSnapshot, TaskStore};
pub use view::{TaskCounts, TaskFilter};
