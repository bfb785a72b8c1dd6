// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable storage for the session token.
//!
//! The token lives in a single named slot, JSON-encoded, so a restarted
//! client can resume the previous session.

use crate::error::{AppError, Result};
use crate::models::AuthToken;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// A single durable slot holding at most one token.
pub trait TokenSlot: Send + Sync {
    fn load(&self) -> Result<Option<AuthToken>>;
    fn save(&self, token: &AuthToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token slot backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenSlot {
    path: PathBuf,
}

impl FileTokenSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSlot for FileTokenSlot {
    fn load(&self) -> Result<Option<AuthToken>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        // A corrupt slot is treated as no session rather than a hard failure.
        match serde_json::from_str::<Option<AuthToken>>(&raw) {
            Ok(token) => Ok(token.filter(|t| !t.as_str().is_empty())),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token slot");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::Storage(e.to_string()))?;
        }
        let encoded =
            serde_json::to_string(token).map_err(|e| AppError::Storage(e.to_string()))?;
        fs::write(&self.path, encoded).map_err(|e| AppError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

/// In-memory token slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenSlot {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Option<AuthToken>>> {
        self.token
            .lock()
            .map_err(|_| AppError::Storage("token slot lock poisoned".to_string()))
    }
}

impl TokenSlot for MemoryTokenSlot {
    fn load(&self) -> Result<Option<AuthToken>> {
        Ok(self.guard()?.clone())
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        *self.guard()? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.guard()? = None;
        Ok(())
    }
}
