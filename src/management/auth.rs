use std::path::{Path, PathBuf};

use crate::{
    config::{self, ServiceConfig},
    service::auth,
    types::Token,
    utils,
};

/// Seconds of remaining validity below which a token gets refreshed.
const REFRESH_MARGIN_SECS: u64 = 240;

/// Holds the OAuth token of one session.
///
/// A manager created from a credential file (or given a path through
/// [`TokenManager::with_path`]) is a saved session: refreshed tokens are
/// written back to that file. Without a path the token only lives for the
/// current run.
pub struct TokenManager {
    token: Token,
    path: Option<PathBuf>,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token, path: None }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Loads the credential file registered under `name`.
    pub async fn load(name: &str) -> Result<Self, String> {
        Self::load_from(credential_path(name)).await
    }

    pub async fn load_from(path: PathBuf) -> Result<Self, String> {
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self {
            token,
            path: Some(path),
        })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Err("session has no credential file".to_string());
        };

        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json).await.map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing it first when it is about to expire.
    ///
    /// A failed refresh is logged and the current token is returned as is; the
    /// following request then fails with the service's authentication error.
    pub async fn get_valid_token(&mut self, config: &ServiceConfig) -> String {
        if self.is_expired() {
            match auth::refresh_token(config, &self.token.refresh_token).await {
                Ok(new_token) => {
                    tracing::debug!("access token refreshed");
                    self.token = new_token;
                    if self.is_saved() {
                        if let Err(e) = self.persist().await {
                            tracing::warn!("failed to persist refreshed token: {}", e);
                        }
                    }
                }
                Err(e) => tracing::warn!("failed to refresh access token: {}", e),
            }
        }

        self.token.access_token.clone()
    }

    pub fn is_expired(&self) -> bool {
        let expires_at = self.token.obtained_at + self.token.expires_in;
        utils::unix_now() + REFRESH_MARGIN_SECS >= expires_at
    }

    pub fn is_saved(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

/// Location of the credential file for the session `name`.
pub fn credential_path(name: &str) -> PathBuf {
    let mut path = config::data_dir();
    path.push("credentials");
    path.push(format!("{}.json", utils::sanitize_component(name)));
    path
}
