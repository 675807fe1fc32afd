//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local runs.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Google's scope for read/write spreadsheet access.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4";

/// Whether the persisted token file may stand in for a session without tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSharing {
    /// Any browser session falls back to the persisted tokens (single operator).
    Shared,
    /// Each browser session must complete its own authorization.
    PerSession,
}

impl FromStr for TokenSharing {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per_session" | "per-session" | "session" => Ok(Self::PerSession),
            _ => Err(()),
        }
    }
}

/// Which backend enforces e-mail uniqueness before a form row is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateGuardMode {
    Off,
    Memory,
    Firestore,
}

impl FromStr for DuplicateGuardMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "" => Ok(Self::Off),
            "memory" => Ok(Self::Memory),
            "firestore" => Ok(Self::Firestore),
            _ => Err(()),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target spreadsheet ID
    pub spreadsheet_id: String,
    /// Default range for reads and appends (e.g. `Sheet1!A1:B1`)
    pub sheet_range: String,
    /// Path to the OAuth client identity JSON
    pub credentials_path: PathBuf,
    /// Path to the persisted token file
    pub token_path: PathBuf,
    /// Server port
    pub port: u16,
    /// Scopes requested on the consent screen
    pub scopes: Vec<String>,
    pub token_sharing: TokenSharing,
    pub duplicate_guard: DuplicateGuardMode,
    /// GCP project ID (Firestore duplicate guard only)
    pub gcp_project_id: Option<String>,

    // --- Provider endpoints ---
    pub oauth_auth_url: String,
    pub oauth_token_url: String,
    pub sheets_api_url: String,

    // --- Secrets ---
    /// HS256 key for the session cookie (raw bytes)
    pub session_signing_key: Vec<u8>,
}

impl Config {
    /// Fixed configuration for tests. Endpoints point at the real provider and
    /// are expected to be overridden with a mock.
    pub fn test_default() -> Self {
        Self {
            spreadsheet_id: "test-spreadsheet".to_string(),
            sheet_range: "Sheet1!A1:B1".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            port: 3000,
            scopes: vec![SPREADSHEETS_SCOPE.to_string()],
            token_sharing: TokenSharing::Shared,
            duplicate_guard: DuplicateGuardMode::Off,
            gcp_project_id: None,
            oauth_auth_url: GOOGLE_AUTH_URL.to_string(),
            oauth_token_url: GOOGLE_TOKEN_URL.to_string(),
            sheets_api_url: SHEETS_API_URL.to_string(),
            session_signing_key: b"test_session_key_32_bytes_min!!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let token_sharing = match env::var("TOKEN_SHARING") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "TOKEN_SHARING",
                value: v,
            })?,
            Err(_) => TokenSharing::Shared,
        };

        let duplicate_guard = match env::var("DUPLICATE_GUARD") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "DUPLICATE_GUARD",
                value: v,
            })?,
            Err(_) => DuplicateGuardMode::Off,
        };

        let gcp_project_id = env::var("GCP_PROJECT_ID").ok().filter(|v| !v.is_empty());
        if duplicate_guard == DuplicateGuardMode::Firestore && gcp_project_id.is_none() {
            return Err(ConfigError::Missing("GCP_PROJECT_ID"));
        }

        let scopes = env::var("OAUTH_SCOPES")
            .map(|v| v.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| vec![SPREADSHEETS_SCOPE.to_string()]);

        Ok(Self {
            spreadsheet_id: env::var("SPREADSHEET_ID")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("SPREADSHEET_ID"))?,
            sheet_range: env::var("SHEET_RANGE").unwrap_or_else(|_| "Sheet1!A1:B1".to_string()),
            credentials_path: env::var("CREDENTIALS_PATH")
                .unwrap_or_else(|_| "credentials.json".to_string())
                .into(),
            token_path: env::var("TOKEN_PATH")
                .unwrap_or_else(|_| "token.json".to_string())
                .into(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            scopes,
            token_sharing,
            duplicate_guard,
            gcp_project_id,
            oauth_auth_url: env::var("OAUTH_AUTH_URL")
                .unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            oauth_token_url: env::var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
            sheets_api_url: env::var("SHEETS_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| SHEETS_API_URL.to_string()),
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Client credentials error: {0}")]
    Credentials(String),
}
