// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Taskmaster: personal task list client.
//!
//! This crate keeps a session-scoped task list in memory and synchronizes it
//! with the task API using bearer tokens. Local changes are tagged pending
//! until the backend confirms them and are rolled back when it does not.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod time_utils;

pub use client::TaskClient;
pub use error::{AppError, Result};
