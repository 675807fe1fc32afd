// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sheet-Intake: collect form submissions into a Google Sheet
//!
//! This crate provides a small web server that authorizes against Google
//! OAuth2, keeps the resulting tokens across restarts, and reads from or
//! appends to a spreadsheet on behalf of the authorized operator.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RecordStore;
use services::{ClientIdentity, OAuthClient, SessionStore, SheetsClient, TokenStore};

/// Shared application state.
///
/// Constructed once at startup and handed to every handler behind an `Arc`.
/// Nothing in here carries per-request credentials; those travel with the
/// request (see [`middleware::auth::BoundCredentials`]).
pub struct AppState {
    pub config: Config,
    pub oauth: OAuthClient,
    pub token_store: TokenStore,
    pub sessions: SessionStore,
    pub sheets: SheetsClient,
    /// Duplicate guard backing store, when enabled.
    pub records: Option<RecordStore>,
}

impl AppState {
    /// Wire the services together from configuration and the loaded client identity.
    pub fn new(config: Config, identity: ClientIdentity, records: Option<RecordStore>) -> Self {
        let oauth = OAuthClient::new(
            identity,
            config.oauth_auth_url.clone(),
            config.oauth_token_url.clone(),
        );
        let token_store = TokenStore::new(config.token_path.clone());
        let sheets = SheetsClient::new(config.sheets_api_url.clone());

        Self {
            config,
            oauth,
            token_store,
            sessions: SessionStore::new(),
            sheets,
            records,
        }
    }
}
