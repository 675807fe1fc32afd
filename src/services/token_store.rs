// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed token persistence.
//!
//! The token file survives restarts so a previously granted authorization
//! keeps working. Writes go to a sibling temp file that is renamed over the
//! target, so readers never see a half-written file.

use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::TokenSet;

/// Persisted token set plus its in-memory copy.
pub struct TokenStore {
    path: PathBuf,
    current: RwLock<Option<TokenSet>>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// Read the token file, if any, and install it as the in-memory copy.
    ///
    /// A missing file is the first-run case and returns `Ok(None)`.
    pub async fn load_persisted(&self) -> Result<Option<TokenSet>, AppError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No persisted tokens");
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::TokenStorage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let tokens: TokenSet = serde_json::from_str(&content).map_err(|e| {
            AppError::TokenStorage(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        *self.current.write().await = Some(tokens.clone());

        tracing::info!(
            path = %self.path.display(),
            expires_at = ?tokens.expires_at,
            has_refresh_token = tokens.refresh_token.is_some(),
            "Tokens loaded from file"
        );
        Ok(Some(tokens))
    }

    /// Overwrite the token file and the in-memory copy.
    pub async fn persist(&self, tokens: &TokenSet) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| AppError::TokenStorage(format!("failed to serialize tokens: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::TokenStorage(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content.as_bytes())
            .await
            .map_err(|e| {
                AppError::TokenStorage(format!("failed to write {}: {}", temp_path.display(), e))
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await
            {
                tracing::warn!(error = %e, "Failed to restrict token file permissions");
            }
        }

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                AppError::TokenStorage(format!("failed to replace {}: {}", self.path.display(), e))
            })?;

        *self.current.write().await = Some(tokens.clone());

        tracing::info!(path = %self.path.display(), "Tokens saved to file");
        Ok(())
    }

    /// The most recently loaded or persisted token set.
    pub async fn current(&self) -> Option<TokenSet> {
        self.current.read().await.clone()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
