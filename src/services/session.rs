// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side browser sessions.
//!
//! The browser only holds a signed cookie naming its session ID; the auth
//! phase and any bound token set live here.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::TokenSet;
use crate::services::auth_flow::{AuthEvent, AuthPhase};

/// Per-browser session state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub phase: AuthPhase,
    pub tokens: Option<TokenSet>,
}

/// Concurrent session map, cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    rng: SystemRandom,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
        }
    }

    /// Create an empty session and return its ID.
    pub fn create(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate session ID")))?;
        let id = URL_SAFE_NO_PAD.encode(bytes);
        self.sessions.insert(id.clone(), Session::default());
        Ok(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn phase(&self, id: &str) -> Option<AuthPhase> {
        self.sessions.get(id).map(|s| s.phase)
    }

    pub fn tokens(&self, id: &str) -> Option<TokenSet> {
        self.sessions.get(id).and_then(|s| s.tokens.clone())
    }

    /// Apply an auth-flow event to a session.
    ///
    /// Tokens are only bound while `Authenticated`; any other resulting phase
    /// drops them.
    pub fn advance(&self, id: &str, event: AuthEvent) -> Result<AuthPhase, AppError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AppError::Session("unknown session".to_string()))?;

        let next = session
            .phase
            .apply(event)
            .map_err(|e| AppError::Session(e.to_string()))?;
        session.phase = next;
        if next != AuthPhase::Authenticated && session.tokens.take().is_some() {
            tracing::debug!(phase = %next, "Unbound tokens from session");
        }
        Ok(next)
    }

    /// Complete the exchange: move to `Authenticated` and bind the tokens.
    pub fn authenticate(&self, id: &str, tokens: TokenSet) -> Result<(), AppError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AppError::Session("unknown session".to_string()))?;

        session.phase = session
            .phase
            .apply(AuthEvent::CodeExchanged)
            .map_err(|e| AppError::Session(e.to_string()))?;
        session.tokens = Some(tokens);
        Ok(())
    }

    /// Replace the tokens bound to an authenticated session (after a refresh).
    pub fn rebind_tokens(&self, id: &str, tokens: TokenSet) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            if session.phase == AuthPhase::Authenticated {
                session.tokens = Some(tokens);
            }
        }
    }

    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
