// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 client for the authorization-code flow.
//!
//! Handles:
//! - Consent URL construction (offline access, so a refresh token is issued)
//! - Authorization code exchange
//! - Access token refresh
//!
//! The client holds only the static client identity. Tokens are returned to
//! the caller and never stored on the client.

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::TokenSet;
use crate::services::credentials::ClientIdentity;

/// OAuth2 client bound to one client identity.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    identity: ClientIdentity,
    auth_url: String,
    token_url: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            scope: self.scope,
            token_type: self.token_type,
        }
    }
}

impl OAuthClient {
    pub fn new(identity: ClientIdentity, auth_url: String, token_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity,
            auth_url,
            token_url,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Build the provider's consent URL for exactly `scopes`.
    ///
    /// Deterministic for a given identity and scope list. Duplicate scopes are
    /// collapsed, first occurrence wins the position.
    pub fn build_consent_url(&self, scopes: &[String]) -> String {
        let mut requested: Vec<&str> = Vec::with_capacity(scopes.len());
        for scope in scopes.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !requested.contains(&scope) {
                requested.push(scope);
            }
        }

        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.identity.client_id),
            urlencoding::encode(&self.identity.redirect_uri),
            urlencoding::encode(&requested.join(" ")),
        )
    }

    /// Exchange an authorization code for a token set.
    ///
    /// An empty code is rejected without contacting the provider. A provider
    /// rejection carries the provider's response body as detail.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::Exchange("authorization code is empty".to_string()));
        }

        let response = self
            .request_tokens(&[
                ("client_id", self.identity.client_id.as_str()),
                ("client_secret", self.identity.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.identity.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        tracing::info!(
            has_refresh_token = response.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );
        Ok(response.into_token_set())
    }

    /// Refresh an access token. Returns a complete replacement token set.
    ///
    /// Google usually omits the refresh token on refresh; the previous one is
    /// carried over in that case.
    pub async fn refresh(&self, tokens: &TokenSet) -> Result<TokenSet, AppError> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::Exchange("no refresh token available".to_string()))?;

        let response = self
            .request_tokens(&[
                ("client_id", self.identity.client_id.as_str()),
                ("client_secret", self.identity.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        let mut refreshed = response.into_token_set();
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = tokens.refresh_token.clone();
        }
        if refreshed.scope.is_none() {
            refreshed.scope = tokens.scope.clone();
        }

        tracing::info!(expires_at = ?refreshed.expires_at, "Access token refreshed");
        Ok(refreshed)
    }

    /// POST to the token endpoint and parse a successful response.
    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Exchange(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Token endpoint rejected request");
            return Err(AppError::Exchange(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Exchange(format!("invalid token response: {}", e)))
    }
}
