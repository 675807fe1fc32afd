// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie handling and token binding for protected routes.

use crate::config::TokenSharing;
use crate::error::AppError;
use crate::models::{AccessToken, TokenSet};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sheet_session";

/// Where unauthenticated callers are sent.
pub const AUTH_ENTRY_POINT: &str = "/auth";

const SESSION_TTL_DAYS: i64 = 30;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (server-side session ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Where the bound token set came from; decides who receives a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenSource {
    /// Bound to this browser session by its own code exchange.
    Session(String),
    /// The persisted token file (shared mode fallback).
    Persisted,
}

/// Credentials for the current request, inserted by [`require_tokens`].
///
/// Handlers pass `access_token` explicitly to each gateway call.
#[derive(Debug, Clone)]
pub struct BoundCredentials {
    pub access_token: AccessToken,
}

/// Create a signed session cookie value for a session ID.
pub fn create_session_jwt(session_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: session_id.to_string(),
        iat: now,
        exp: now + (SESSION_TTL_DAYS as usize) * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session cookie value and return its session ID.
pub fn decode_session_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Session ID from the request's cookie, if the signature checks out.
pub fn session_id_from_jar(jar: &CookieJar, signing_key: &[u8]) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session_jwt(cookie.value(), signing_key))
}

/// Build the session cookie. `secure` should follow the deployment's scheme.
pub fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Cookie used to clear the session cookie (attributes must match creation).
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Middleware that requires a token set for the caller.
///
/// Lookup order: the session's own tokens, then (in shared mode) the
/// persisted tokens. With neither, the caller is redirected to the
/// authorization entry point and the handler never runs. Expired tokens are
/// refreshed once before the handler runs.
pub async fn require_tokens(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = session_id_from_jar(&jar, &state.config.session_signing_key);

    let session_tokens = session_id
        .as_deref()
        .and_then(|id| state.sessions.tokens(id).map(|t| (t, id.to_string())));

    let (tokens, source) = match session_tokens {
        Some((tokens, id)) => (tokens, TokenSource::Session(id)),
        None => match state.config.token_sharing {
            TokenSharing::Shared => match state.token_store.current().await {
                Some(tokens) => (tokens, TokenSource::Persisted),
                None => return Ok(redirect_to_auth(request.uri().path())),
            },
            TokenSharing::PerSession => return Ok(redirect_to_auth(request.uri().path())),
        },
    };

    let tokens = refresh_if_expired(&state, tokens, &source).await?;

    request.extensions_mut().insert(BoundCredentials {
        access_token: tokens.access(),
    });

    Ok(next.run(request).await)
}

fn redirect_to_auth(path: &str) -> Response {
    tracing::debug!(path, "No tokens bound, redirecting to authorization");
    Redirect::to(AUTH_ENTRY_POINT).into_response()
}

/// Refresh an expired token set and write the replacement back to its owner.
///
/// Without a refresh token the stale set is used as-is and the provider
/// decides.
async fn refresh_if_expired(
    state: &AppState,
    tokens: TokenSet,
    source: &TokenSource,
) -> Result<TokenSet, AppError> {
    if !tokens.is_expired() || tokens.refresh_token.is_none() {
        return Ok(tokens);
    }

    tracing::info!(source = ?source, "Access token expired, refreshing");
    let refreshed = state.oauth.refresh(&tokens).await?;

    match source {
        TokenSource::Session(id) => {
            state.sessions.rebind_tokens(id, refreshed.clone());
            if state.config.token_sharing == TokenSharing::Shared {
                state.token_store.persist(&refreshed).await?;
            }
        }
        TokenSource::Persisted => state.token_store.persist(&refreshed).await?,
    }

    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_jwt_roundtrip() {
        let key = b"test_session_key_32_bytes_min!!!";
        let token = create_session_jwt("session-abc", key).unwrap();

        assert_eq!(decode_session_jwt(&token, key), Some("session-abc".to_string()));
        assert_eq!(decode_session_jwt(&token, b"some_other_key_32_bytes_minimum!"), None);
        assert_eq!(decode_session_jwt("invalid.token.here", key), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("value".to_string(), false).to_string();

        assert!(cookie.starts_with("sheet_session=value"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("v".to_string(), true)
            .to_string()
            .contains("Secure"));
    }
}
