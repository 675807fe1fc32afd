// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authorization routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_session_jwt, removal_cookie, session_cookie, session_id_from_jar,
};
use crate::services::{AuthEvent, AuthPhase};
use crate::AppState;

/// Page shown after a successful exchange.
pub const AFTER_AUTH_REDIRECT: &str = "/enter-details";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/auth", get(auth_start))
        .route("/oauth2callback", get(auth_callback))
        .route("/auth/logout", get(logout))
}

async fn index() -> Html<&'static str> {
    Html(r#"<a href="/auth">Authorize with Google</a>"#)
}

/// Start OAuth flow - redirect to Google consent screen.
async fn auth_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let key = &state.config.session_signing_key;

    // Reuse the caller's session if it is still known, otherwise start fresh
    let session_id = match session_id_from_jar(&jar, key) {
        Some(id) if state.sessions.contains(&id) => id,
        _ => state.sessions.create()?,
    };

    state
        .sessions
        .advance(&session_id, AuthEvent::ConsentUrlBuilt)?;
    let consent_url = state.oauth.build_consent_url(&state.config.scopes);
    state
        .sessions
        .advance(&session_id, AuthEvent::RedirectIssued)?;

    let jwt = create_session_jwt(&session_id, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let secure = state.oauth.identity().redirect_uri.starts_with("https://");
    let jar = jar.add(session_cookie(jwt, secure));

    tracing::info!(
        client_id = %state.oauth.identity().client_id,
        scopes = ?state.config.scopes,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok((StatusCode::FOUND, jar, [(header::LOCATION, consent_url)]).into_response())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, persist and bind them.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let session_id = session_id_from_jar(&jar, &state.config.session_signing_key);

    // Check for OAuth errors (e.g. consent denied)
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        if let Some(id) = &session_id {
            if let Err(e) = state.sessions.advance(id, AuthEvent::ExchangeFailed) {
                tracing::debug!(error = %e, "No pending authorization to reset");
            }
        }
        return Err(AppError::Validation(format!("Authorization failed: {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No code found in query parameters".to_string()))?;

    let session_id = session_id
        .filter(|id| state.sessions.phase(id) == Some(AuthPhase::AwaitingCallback))
        .ok_or_else(|| {
            AppError::Session("No authorization in progress; start again at /auth".to_string())
        })?;

    tracing::info!("Exchanging authorization code for tokens");

    let tokens = match state.oauth.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            state
                .sessions
                .advance(&session_id, AuthEvent::ExchangeFailed)?;
            return Err(e);
        }
    };

    if let Err(e) = state.token_store.persist(&tokens).await {
        state
            .sessions
            .advance(&session_id, AuthEvent::ExchangeFailed)?;
        return Err(e);
    }
    state.sessions.authenticate(&session_id, tokens)?;

    tracing::info!("OAuth successful, tokens persisted and bound to session");

    Ok(Redirect::to(AFTER_AUTH_REDIRECT).into_response())
}

/// Logout - forget the server-side session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(id) = session_id_from_jar(&jar, &state.config.session_signing_key) {
        state.sessions.remove(&id);
        tracing::info!("Session signed out");
    }

    (jar.remove(removal_cookie()), Redirect::to("/"))
}
