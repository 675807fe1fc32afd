// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth_flow;
pub mod credentials;
pub mod oauth;
pub mod session;
pub mod sheets;
pub mod token_store;

pub use auth_flow::{AuthEvent, AuthFlowError, AuthPhase};
pub use credentials::ClientIdentity;
pub use oauth::OAuthClient;
pub use session::{Session, SessionStore};
pub use sheets::SheetsClient;
pub use token_store::TokenStore;
