// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token store: the session's token and user profile.
//!
//! State machine:
//!
//! ```text
//! Anonymous -> Authenticating -> Authenticated
//!     ^                               |
//!     +---- logout / auth failure ----+
//! ```
//!
//! Tokens are never renewed. An expired token shows up as an authorization
//! failure on some later call, which sends the session back to `Anonymous`.
//!
//! Every identity change bumps [`SessionSnapshot::generation`]. Dependent
//! state (the task list) is keyed on the generation and cleared when it moves.

use crate::error::{AppError, Result};
use crate::models::{AuthToken, Credentials, User};
use crate::services::{SyncGateway, TokenSlot};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Login in progress, or a restored token not yet verified.
    Authenticating,
    Authenticated,
}

/// Published state of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub token: Option<AuthToken>,
    pub user: Option<User>,
    /// Bumped whenever the session identity changes
    pub generation: u64,
}

/// Owner of the session token.
///
/// Passed by reference to whatever needs the session; observers use
/// [`TokenStore::subscribe`].
pub struct TokenStore {
    state: watch::Sender<SessionSnapshot>,
    slot: Arc<dyn TokenSlot>,
    /// Serializes login and restore.
    transition: Mutex<()>,
}

impl TokenStore {
    pub fn new(slot: Arc<dyn TokenSlot>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            state,
            slot,
            transition: Mutex::new(()),
        }
    }

    /// Token to send with the next call, if any.
    pub fn current_token(&self) -> Option<AuthToken> {
        self.state.borrow().token.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().state
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Log in and load the user's profile.
    ///
    /// Nothing is committed until both the login and the profile fetch
    /// succeed. On failure the previous session is left as it was. If the
    /// session was ended while the calls were in flight, the new token is
    /// dropped and the login fails with `Unauthenticated`.
    pub async fn login(&self, gateway: &SyncGateway, credentials: &Credentials) -> Result<User> {
        let _guard = self.transition.lock().await;
        let prior = self.snapshot();

        self.state.send_modify(|s| s.state = SessionState::Authenticating);
        tracing::debug!(email = %credentials.email, "Logging in");

        let result = async {
            let token = gateway.login(credentials).await?;
            let user = gateway.fetch_profile(&token).await?;
            Ok::<_, AppError>((token, user))
        }
        .await;

        match result {
            Ok((token, user)) => {
                // Saved under the state lock so a racing logout clears it afterwards.
                let committed = self.state.send_if_modified(|s| {
                    if s.generation != prior.generation {
                        return false;
                    }
                    if let Err(e) = self.slot.save(&token) {
                        tracing::warn!(error = %e, "Failed to persist session token");
                    }
                    *s = SessionSnapshot {
                        state: SessionState::Authenticated,
                        token: Some(token.clone()),
                        user: Some(user.clone()),
                        generation: s.generation + 1,
                    };
                    true
                });
                if !committed {
                    tracing::info!("Session ended while logging in, dropping new token");
                    return Err(AppError::Unauthenticated);
                }
                tracing::info!(user_id = %user.id, "Session authenticated");
                Ok(user)
            }
            Err(e) => {
                // Only undo our own transition; a logout in the meantime wins.
                self.state.send_if_modified(|s| {
                    if s.generation != prior.generation {
                        return false;
                    }
                    s.state = prior.state;
                    true
                });
                tracing::info!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// End the session and forget the stored token.
    pub fn logout(&self) {
        self.state.send_modify(|s| {
            *s = SessionSnapshot {
                generation: s.generation + 1,
                ..SessionSnapshot::default()
            };
        });
        if let Err(e) = self.slot.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session token");
        }
        tracing::info!("Session ended");
    }

    /// End the session because `token` was rejected by the backend.
    ///
    /// Ignored if the session has already moved on to a different token, so a
    /// late failure from an old session cannot log out a new one. Returns true
    /// if the session was torn down.
    pub fn invalidate(&self, token: &AuthToken) -> bool {
        if self.current_token().as_ref() != Some(token) {
            return false;
        }
        tracing::warn!("Token rejected by backend, ending session");
        self.logout();
        true
    }

    /// Resume the session saved by a previous run.
    ///
    /// A stored token is tentative (`Authenticating`) until the profile fetch
    /// succeeds. If the backend rejects it, it is discarded and the session
    /// stays anonymous (`Ok(None)`). Other failures keep the tentative token
    /// and are returned to the caller.
    pub async fn restore_from_persistence(&self, gateway: &SyncGateway) -> Result<Option<User>> {
        let _guard = self.transition.lock().await;

        let stored = match self.slot.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored session token");
                None
            }
        };

        let Some(token) = stored else {
            tracing::debug!("No stored session token");
            return Ok(None);
        };

        self.state.send_modify(|s| {
            *s = SessionSnapshot {
                state: SessionState::Authenticating,
                token: Some(token.clone()),
                user: None,
                generation: s.generation + 1,
            };
        });
        let generation = self.generation();

        match gateway.fetch_profile(&token).await {
            Ok(user) => {
                let committed = self.state.send_if_modified(|s| {
                    if s.generation != generation {
                        return false;
                    }
                    s.state = SessionState::Authenticated;
                    s.user = Some(user.clone());
                    true
                });
                if !committed {
                    tracing::debug!("Session changed while verifying stored token");
                    return Ok(None);
                }
                tracing::info!(user_id = %user.id, "Session restored");
                Ok(Some(user))
            }
            Err(AppError::Unauthenticated) => {
                tracing::info!("Stored session token rejected");
                self.invalidate(&token);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not verify stored session token");
                Err(e)
            }
        }
    }
}
