//! Configuration management for the playlist downloader.
//!
//! Configuration values come from environment variables, optionally loaded from
//! a `.env` file in the local data directory. The service endpoints and the
//! OAuth client settings are collected once into a [`ServiceConfig`] which is
//! then handed to the service client and the callback server.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::Res;

pub const APP_DIR: &str = "plgrab";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_SCOPE: &str = "playlist-read-private streaming";

/// Returns the platform-specific data directory of the application.
///
/// - Linux: `~/.local/share/plgrab`
/// - macOS: `~/Library/Application Support/plgrab`
/// - Windows: `%LOCALAPPDATA%/plgrab`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the data directory if it doesn't exist. Variables already present
/// in the environment are not overwritten.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing `.env`
/// file cannot be parsed. A missing file is fine, all values may as well come
/// from the real environment.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(())
}

/// Endpoints and OAuth client settings of the music streaming service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the web API, e.g. `https://api.example.com/v1`.
    pub api_url: String,
    /// OAuth authorization endpoint the browser is sent to.
    pub auth_url: String,
    /// OAuth token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Token revocation endpoint. Unsaved sessions are revoked on logout when set.
    pub revoke_url: Option<String>,
    pub client_id: String,
    /// Must match the redirect URI registered with the service.
    pub redirect_uri: String,
    pub scope: String,
    /// Address the local OAuth callback server binds to.
    pub server_addr: String,
}

impl ServiceConfig {
    /// Collects the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails with a message naming the variable when a required variable is
    /// not set.
    pub fn from_env() -> Res<Self> {
        Ok(Self {
            api_url: required("MUSIC_API_URL")?,
            auth_url: required("MUSIC_API_AUTH_URL")?,
            token_url: required("MUSIC_API_TOKEN_URL")?,
            revoke_url: optional("MUSIC_API_REVOKE_URL"),
            client_id: required("MUSIC_API_AUTH_CLIENT_ID")?,
            redirect_uri: optional("MUSIC_API_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            scope: optional("MUSIC_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            server_addr: optional("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
        })
    }
}

fn required(key: &str) -> Res<String> {
    optional(key).ok_or_else(|| format!("{} must be set", key).into())
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
