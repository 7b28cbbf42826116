#![allow(dead_code)]

pub mod mock;

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use futures_util::io::{AsyncWrite, AsyncWriteExt};
use reqwest::StatusCode;

use plgrab::{
    config::ServiceConfig,
    service::{MusicService, ServiceError},
    types::{AlbumRef, ArtistRef, Owner, Playlist, Token, Track, TrackCount},
    utils,
};

// Helper function to create a test playlist
pub fn create_test_playlist(id: &str, name: &str, owner: &str, description: Option<&str>) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        description: description.map(str::to_string),
        owner: Owner {
            id: owner.to_lowercase(),
            display_name: Some(owner.to_string()),
        },
        tracks: TrackCount { total: 0 },
    }
}

// Helper function to create a test track
pub fn create_test_track(id: &str, title: &str, artist: &str, album: &str, number: u32) -> Track {
    Track {
        id: id.to_string(),
        name: title.to_string(),
        artists: vec![ArtistRef {
            name: artist.to_string(),
        }],
        album: Some(AlbumRef {
            name: album.to_string(),
            artists: vec![ArtistRef {
                name: artist.to_string(),
            }],
            release_date: Some("2003-09-15".to_string()),
            genres: vec!["Rock".to_string()],
        }),
        track_number: Some(number),
        disc_number: Some(1),
        duration_ms: 215_400,
    }
}

pub fn create_test_token(access_token: &str, obtained_at: u64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "test-refresh-token".to_string(),
        scope: "playlist-read-private".to_string(),
        expires_in: 3600,
        obtained_at,
    }
}

pub fn fresh_token(access_token: &str) -> Token {
    create_test_token(access_token, utils::unix_now())
}

pub fn test_config(base_url: &str) -> ServiceConfig {
    ServiceConfig {
        api_url: format!("{}/v1", base_url),
        auth_url: format!("{}/authorize", base_url),
        token_url: format!("{}/token", base_url),
        revoke_url: None,
        client_id: "test-client".to_string(),
        redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
        scope: "playlist-read-private streaming".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
    }
}

pub fn audio_bytes(track_id: &str) -> Vec<u8> {
    format!("ID3-audio-of-{}", track_id).into_bytes()
}

/// In-memory stand-in for the remote service.
#[derive(Default)]
pub struct StubService {
    pub playlists: Vec<Playlist>,
    pub tracks: HashMap<String, Vec<Track>>,
    pub failing: HashSet<String>,
    pub streamed: Mutex<Vec<String>>,
    pub logouts: AtomicUsize,
    pub listing_fails: bool,
}

impl StubService {
    pub fn with_playlist(mut self, playlist: Playlist, tracks: Vec<Track>) -> Self {
        self.tracks.insert(playlist.id.clone(), tracks);
        self.playlists.push(playlist);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn failing_track(mut self, track_id: &str) -> Self {
        self.failing.insert(track_id.to_string());
        self
    }

    pub fn streamed(&self) -> Vec<String> {
        self.streamed.lock().unwrap().clone()
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MusicService for StubService {
    async fn playlists(&self) -> Result<Vec<Playlist>, ServiceError> {
        if self.listing_fails {
            return Err(ServiceError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                url: "stub://me/playlists".to_string(),
            });
        }
        Ok(self.playlists.clone())
    }

    async fn playlist_tracks(&self, playlist: &Playlist) -> Result<Vec<Track>, ServiceError> {
        self.tracks
            .get(&playlist.id)
            .cloned()
            .ok_or_else(|| ServiceError::Status {
                status: StatusCode::NOT_FOUND,
                url: format!("stub://playlists/{}/tracks", playlist.id),
            })
    }

    async fn stream_to(
        &self,
        track: &Track,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ServiceError> {
        self.streamed.lock().unwrap().push(track.id.clone());

        let bytes = audio_bytes(&track.id);
        if self.failing.contains(&track.id) {
            // half a file, then the connection drops
            sink.write_all(&bytes[..bytes.len() / 2]).await?;
            return Err(ServiceError::Io(std::io::Error::other("connection reset")));
        }

        sink.write_all(&bytes).await?;
        sink.flush().await?;
        Ok(bytes.len() as u64)
    }

    async fn logout(&self) -> Result<(), ServiceError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
