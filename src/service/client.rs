use std::time::Duration;

use async_trait::async_trait;
use futures_util::{
    StreamExt,
    io::{AsyncWrite, AsyncWriteExt},
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::ServiceConfig,
    management::TokenManager,
    service::{MusicService, ServiceError, auth, decode_json},
    types::{Page, Playlist, PlaylistItem, StreamResponse, Track},
};

const PLAYLIST_PAGE_SIZE: u32 = 50;
const TRACK_PAGE_SIZE: u32 = 100;
/// Total time spent waiting on `429` answers for one request.
const MAX_RETRY_AFTER_SECS: u64 = 120;
const MAX_RATE_LIMIT_RETRIES: u32 = 10;
const MAX_BAD_GATEWAY_RETRIES: u32 = 3;

pub struct HttpMusicService {
    client: Client,
    config: ServiceConfig,
    tokens: Mutex<TokenManager>,
    retry_pause: Duration,
}

impl HttpMusicService {
    pub fn new(config: ServiceConfig, tokens: TokenManager) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens: Mutex::new(tokens),
            retry_pause: Duration::from_secs(10),
        }
    }

    /// Pause between retries of a `502 Bad Gateway` answer.
    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    async fn access_token(&self) -> String {
        let mut tokens = self.tokens.lock().await;
        tokens.get_valid_token(&self.config).await
    }

    /// Sends an authenticated GET, retrying on `502` and `429`.
    async fn get(&self, url: &str) -> Result<Response, ServiceError> {
        let mut bad_gateways = 0;
        let mut rate_limits = 0;
        let mut waited_secs = 0;

        loop {
            let token = self.access_token().await;
            tracing::debug!("GET {}", url);
            let response = self.client.get(url).bearer_auth(token).send().await?;

            match response.status() {
                status if status.is_success() => return Ok(response),
                StatusCode::BAD_GATEWAY if bad_gateways < MAX_BAD_GATEWAY_RETRIES => {
                    bad_gateways += 1;
                    tracing::warn!(
                        "{} returned 502, retry {}/{}",
                        url,
                        bad_gateways,
                        MAX_BAD_GATEWAY_RETRIES
                    );
                    sleep(self.retry_pause).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = retry_after_secs(&response);
                    if rate_limits >= MAX_RATE_LIMIT_RETRIES
                        || waited_secs + retry_after > MAX_RETRY_AFTER_SECS
                    {
                        return Err(ServiceError::RateLimited(waited_secs + retry_after));
                    }
                    rate_limits += 1;
                    waited_secs += retry_after;
                    tracing::warn!(
                        "rate limited, waiting {} seconds (retry {}/{})",
                        retry_after,
                        rate_limits,
                        MAX_RATE_LIMIT_RETRIES
                    );
                    sleep(Duration::from_secs(retry_after)).await;
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(ServiceError::Auth(
                        "session expired or revoked, run `plgrab auth` again".to_string(),
                    ));
                }
                status => {
                    return Err(ServiceError::Status {
                        status,
                        url: url.to_string(),
                    });
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ServiceError> {
        let response = self.get(url).await?;
        decode_json(response).await
    }

    /// Collects every page starting at `url`, following `next` links.
    async fn get_all<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>, ServiceError> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next {
            let page: Page<T> = self.get_json(&url).await?;
            tracing::debug!(
                "fetched {} items (total {:?})",
                page.items.len(),
                page.total
            );
            items.extend(page.items);
            next = page.next;
        }

        Ok(items)
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

#[async_trait]
impl MusicService for HttpMusicService {
    async fn playlists(&self) -> Result<Vec<Playlist>, ServiceError> {
        let url = format!(
            "{api}/me/playlists?limit={limit}&offset=0",
            api = self.config.api_url.trim_end_matches('/'),
            limit = PLAYLIST_PAGE_SIZE
        );
        self.get_all(url).await
    }

    async fn playlist_tracks(&self, playlist: &Playlist) -> Result<Vec<Track>, ServiceError> {
        let url = format!(
            "{api}/playlists/{id}/tracks?limit={limit}&offset=0",
            api = self.config.api_url.trim_end_matches('/'),
            id = playlist.id,
            limit = TRACK_PAGE_SIZE
        );
        let items: Vec<PlaylistItem> = self.get_all(url).await?;
        Ok(items.into_iter().filter_map(|item| item.track).collect())
    }

    async fn stream_to(
        &self,
        track: &Track,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ServiceError> {
        let url = format!(
            "{api}/tracks/{id}/stream",
            api = self.config.api_url.trim_end_matches('/'),
            id = track.id
        );
        let stream: StreamResponse = self.get_json(&url).await?;

        // the stream URL is pre-signed, the bearer token stays with the API host
        tracing::debug!("streaming track {}", track.id);
        let response = self.client.get(&stream.url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Status {
                status: response.status(),
                url: stream.url,
            });
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        Ok(written)
    }

    async fn logout(&self) -> Result<(), ServiceError> {
        let tokens = self.tokens.lock().await;
        if tokens.is_saved() {
            tracing::debug!("keeping saved session");
            return Ok(());
        }

        match &self.config.revoke_url {
            Some(revoke_url) => {
                auth::revoke_token(&self.config, revoke_url, &tokens.current_token().access_token)
                    .await
            }
            None => Ok(()),
        }
    }
}
