//! OAuth 2.0 PKCE login against the music service.
//!
//! The flow opens the authorization page in the user's browser and receives the
//! authorization code on a short-lived local callback server (see
//! [`crate::server`]). The code is exchanged for a [`Token`] together with the
//! PKCE verifier, so no client secret is needed.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    config::ServiceConfig,
    server,
    service::ServiceError,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

const AUTH_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs the interactive PKCE flow and returns the obtained token.
///
/// Nothing is persisted here; the caller decides whether the session is saved.
pub async fn authorize(config: &ServiceConfig) -> Result<Token, ServiceError> {
    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));

    // generate PKCE verifier and challenge
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    // store verifier in shared state before the browser can hit the callback
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let listener = server::bind(config).await?;
    let server_handle = tokio::spawn(server::serve(
        listener,
        config.clone(),
        Arc::clone(&shared_state),
    ));

    let auth_url = authorize_url(config, &code_challenge)?;
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server_handle.abort();

    token.ok_or_else(|| ServiceError::Auth("no authorization received in time".to_string()))
}

/// Builds the URL of the authorization page the user is sent to.
pub fn authorize_url(config: &ServiceConfig, code_challenge: &str) -> Result<Url, ServiceError> {
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", config.scope.as_str()),
        ],
    )
    .map_err(|e| ServiceError::Auth(format!("invalid authorization URL: {}", e)))
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < AUTH_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(pkce_token) = lock.as_ref() {
            if let Some(token) = &pkce_token.token {
                return Some(token.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

pub async fn exchange_code_pkce(
    config: &ServiceConfig,
    code: &str,
    verifier: &str,
) -> Result<Token, ServiceError> {
    let response = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    token_from_response(response, None).await
}

/// Exchanges a refresh token for a new access token.
///
/// Services may omit the refresh token in the answer, the old one stays valid then.
pub async fn refresh_token(
    config: &ServiceConfig,
    refresh_token: &str,
) -> Result<Token, ServiceError> {
    let response = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await?;

    token_from_response(response, Some(refresh_token)).await
}

pub async fn revoke_token(
    config: &ServiceConfig,
    revoke_url: &str,
    access_token: &str,
) -> Result<(), ServiceError> {
    let response = Client::new()
        .post(revoke_url)
        .form(&[
            ("token", access_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ServiceError::Status {
            status: response.status(),
            url: revoke_url.to_string(),
        });
    }

    tracing::debug!("session revoked");
    Ok(())
}

async fn token_from_response(
    response: reqwest::Response,
    previous_refresh_token: Option<&str>,
) -> Result<Token, ServiceError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Auth(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    let json: TokenResponse = super::decode_json(response).await?;
    let refresh_token = json
        .refresh_token
        .or_else(|| previous_refresh_token.map(str::to_string))
        .unwrap_or_default();

    Ok(Token {
        access_token: json.access_token,
        refresh_token,
        scope: json.scope.unwrap_or_default(),
        expires_in: json.expires_in.unwrap_or(3600),
        obtained_at: utils::unix_now(),
    })
}
