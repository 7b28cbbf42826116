//! # Music Service Module
//!
//! The remote music streaming service is an external collaborator: it owns
//! authentication, the playlist catalog and audio delivery. This module is the
//! seam between the downloader and that service.
//!
//! ## Overview
//!
//! - [`MusicService`] is the trait the rest of the crate programs against. The
//!   downloader only needs to list playlists, list a playlist's tracks, stream a
//!   track's audio into a writer and close the session.
//! - [`HttpMusicService`] implements it over the service's JSON web API with
//!   `reqwest`, a bearer token from [`crate::management::TokenManager`] and the
//!   endpoints from [`crate::config::ServiceConfig`].
//! - [`auth`] implements the OAuth 2.0 PKCE login flow (browser plus local
//!   callback server), code exchange, token refresh and revocation.
//!
//! ## API Coverage
//!
//! - `GET /me/playlists` - Playlists of the account, paginated through `next`
//! - `GET /playlists/{id}/tracks` - Tracks of one playlist, paginated through `next`
//! - `GET /tracks/{id}/stream` - Signed URL the audio bytes are fetched from
//! - `POST <token url>` - Code exchange and refresh
//! - `POST <revoke url>` - Session revocation (optional)
//!
//! ## Error Handling
//!
//! - `502 Bad Gateway` is retried a few times after a pause
//! - `429 Too Many Requests` honours `Retry-After` for at most two minutes
//!   in total, then gives up
//! - `401 Unauthorized` is reported as an authentication error so the user
//!   knows to log in again

use std::fmt;

use async_trait::async_trait;
use futures_util::io::AsyncWrite;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::types::{Playlist, Track};

pub mod auth;
mod client;

pub use client::HttpMusicService;

#[derive(Debug)]
pub enum ServiceError {
    Http(reqwest::Error),
    /// The response body is not the JSON we expect.
    Decode(serde_json::Error),
    /// The service answered with a status we don't handle.
    Status { status: StatusCode, url: String },
    /// The service asked us to back off for longer than we are willing to wait.
    RateLimited(u64),
    Auth(String),
    Io(std::io::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Http(e) => write!(f, "request failed: {}", e),
            ServiceError::Decode(e) => write!(f, "unexpected response from the service: {}", e),
            ServiceError::Status { status, url } => write!(f, "{} returned {}", url, status),
            ServiceError::RateLimited(secs) => write!(
                f,
                "rate limited by the service for {} seconds, try again later",
                secs
            ),
            ServiceError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            ServiceError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Http(e) => Some(e),
            ServiceError::Decode(e) => Some(e),
            ServiceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Http(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err)
    }
}

/// Reads a response body as JSON, keeping decode failures apart from
/// transport failures.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Operations the downloader needs from a music streaming service.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// All playlists of the logged in account, in the order the service lists them.
    async fn playlists(&self) -> Result<Vec<Playlist>, ServiceError>;

    /// Tracks of `playlist` in playlist order. Entries that are no longer
    /// available in the catalog are left out.
    async fn playlist_tracks(&self, playlist: &Playlist) -> Result<Vec<Track>, ServiceError>;

    /// Writes the audio of `track` into `sink` and returns the number of bytes written.
    async fn stream_to(
        &self,
        track: &Track,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ServiceError>;

    /// Ends the session.
    async fn logout(&self) -> Result<(), ServiceError>;
}
