//! In-process stand-in for the service's web API and OAuth endpoints.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const VALID_TOKEN: &str = "test-token";
pub const VALID_CODE: &str = "good-code";

pub struct MockApi {
    pub base: String,
    pub bad_gateways: AtomicUsize,
    /// Playlist listing requests answered with `429` before serving again.
    pub rate_limits: AtomicUsize,
    pub retry_after: AtomicU64,
    pub listing_requests: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub revoked: Mutex<Vec<String>>,
    pub exchanged_verifiers: Mutex<Vec<String>>,
}

pub async fn spawn_mock(bad_gateways: usize) -> Arc<MockApi> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let api = Arc::new(MockApi {
        base,
        bad_gateways: AtomicUsize::new(bad_gateways),
        rate_limits: AtomicUsize::new(0),
        retry_after: AtomicU64::new(0),
        listing_requests: AtomicUsize::new(0),
        refreshes: AtomicUsize::new(0),
        revoked: Mutex::new(Vec::new()),
        exchanged_verifiers: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v1/me/playlists", get(playlists))
        .route("/v1/playlists/{id}/tracks", get(playlist_tracks))
        .route("/v1/tracks/{id}/stream", get(stream))
        .route("/audio/{id}", get(audio))
        .route("/token", post(token))
        .route("/revoke", post(revoke))
        .with_state(Arc::clone(&api));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    api
}

pub fn audio_for(track_id: &str) -> Vec<u8> {
    format!("mp3-frames-of-{}", track_id).into_bytes()
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", VALID_TOKEN);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn playlist_json(id: &str, name: &str, owner: &str, total: u64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "owner": { "id": owner.to_lowercase(), "display_name": owner },
        "tracks": { "total": total }
    })
}

fn track_json(id: &str, name: &str, artist: &str, album: &str, number: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "name": artist }],
        "album": {
            "name": album,
            "artists": [{ "name": artist }],
            "release_date": "2003-09-15"
        },
        "track_number": number,
        "disc_number": 1,
        "duration_ms": 227000
    })
}

async fn playlists(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    api.listing_requests.fetch_add(1, Ordering::SeqCst);

    let limited = api.rate_limits.load(Ordering::SeqCst);
    if limited > 0 {
        api.rate_limits.store(limited - 1, Ordering::SeqCst);
        let retry_after = api.retry_after.load(Ordering::SeqCst).to_string();
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after)],
        )
            .into_response();
    }

    let pending = api.bad_gateways.load(Ordering::SeqCst);
    if pending > 0 {
        api.bad_gateways.store(pending - 1, Ordering::SeqCst);
        return StatusCode::BAD_GATEWAY.into_response();
    }

    let offset: u32 = query
        .get("offset")
        .and_then(|o| o.parse().ok())
        .unwrap_or(0);

    let page = if offset == 0 {
        json!({
            "items": [
                playlist_json("p1", "Workout", "Alice", 2),
                playlist_json("p2", "Chill", "Bob", 0),
            ],
            "next": format!("{}/v1/me/playlists?limit=50&offset=2", api.base),
            "total": 3
        })
    } else {
        json!({
            "items": [playlist_json("p3", "Road Trip", "Alice", 5)],
            "next": null,
            "total": 3
        })
    };

    Json(page).into_response()
}

async fn playlist_tracks(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id == "garbled" {
        return "{\"items\": [".into_response();
    }
    if id != "p1" {
        return StatusCode::NOT_FOUND.into_response();
    }

    Json(json!({
        "items": [
            { "track": track_json("t1", "Hysteria", "Muse", "Absolution", 8) },
            { "track": null },
            { "track": track_json("t2", "Starlight", "Muse", "Black Holes and Revelations", 2) }
        ],
        "next": null,
        "total": 3
    }))
    .into_response()
}

async fn stream(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(json!({ "url": format!("{}/audio/{}", api.base, id) })).into_response()
}

async fn audio(headers: HeaderMap, Path(id): Path<String>) -> Response {
    // signed URLs must not receive the bearer token
    if headers.contains_key(header::AUTHORIZATION) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    audio_for(&id).into_response()
}

async fn token(
    State(api): State<Arc<MockApi>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match form.get("grant_type").map(String::as_str) {
        Some("refresh_token") => {
            api.refreshes.fetch_add(1, Ordering::SeqCst);
            Json(json!({ "access_token": VALID_TOKEN, "expires_in": 3600 })).into_response()
        }
        Some("authorization_code") if form.get("code").map(String::as_str) == Some(VALID_CODE) => {
            if let Some(verifier) = form.get("code_verifier") {
                api.exchanged_verifiers
                    .lock()
                    .unwrap()
                    .push(verifier.clone());
            }
            Json(json!({
                "access_token": VALID_TOKEN,
                "refresh_token": "issued-refresh-token",
                "scope": "playlist-read-private streaming",
                "expires_in": 3600
            }))
            .into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "invalid_grant").into_response(),
    }
}

async fn revoke(
    State(api): State<Arc<MockApi>>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    if let Some(token) = form.get("token") {
        api.revoked.lock().unwrap().push(token.clone());
    }
    StatusCode::OK
}
