// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth client identity loaded from a Google Cloud Console credentials file.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::config::ConfigError;

/// Static client identity. Loaded once; immutable for the process lifetime.
#[derive(Clone)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
    /// First entry of `redirect_uris`
    pub redirect_uri: String,
}

/// Console download format: an `installed` or `web` section.
#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
}

#[derive(Deserialize)]
struct NestedCredentials {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl ClientIdentity {
    /// Read and validate the identity file. Any failure is fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Credentials(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::Credentials(format!("failed to parse credentials: {}", e)))?;

        let nested = file.installed.or(file.web).ok_or_else(|| {
            ConfigError::Credentials(
                "credentials file must contain an 'installed' or 'web' section".to_string(),
            )
        })?;

        let redirect_uri = nested
            .redirect_uris
            .into_iter()
            .next()
            .unwrap_or_default();

        let identity = Self {
            client_id: nested.client_id.trim().to_string(),
            client_secret: nested.client_secret.trim().to_string(),
            redirect_uri: redirect_uri.trim().to_string(),
        };

        for (field, value) in [
            ("client_id", &identity.client_id),
            ("client_secret", &identity.client_secret),
            ("redirect_uris[0]", &identity.redirect_uri),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Credentials(format!(
                    "credentials field {} is missing or empty",
                    field
                )));
            }
        }

        Ok(identity)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
