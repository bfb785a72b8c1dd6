// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External collaborators: the task API and durable token storage.

pub mod gateway;
pub mod token_slot;

pub use gateway::{Created, SyncGateway};
pub use token_slot::{FileTokenSlot, MemoryTokenSlot, TokenSlot};
