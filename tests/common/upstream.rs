//! In-process stand-ins for the Spotify Web API, the Spotify accounts service
//! and MusicBrainz WS/2, served by one axum app under different prefixes.

use super::constants::*;
use super::fixtures;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct UpstreamState {
    pub token_requests: AtomicUsize,
    pub spotify_requests: AtomicUsize,
    pub musicbrainz_requests: AtomicUsize,
    /// The next N MusicBrainz requests answer 503 with `Retry-After: 0`.
    pub musicbrainz_unavailable: AtomicUsize,
    /// When 1, the next Spotify API call answers 401 whatever the token.
    pub reject_next_api_call: AtomicUsize,
    pub now_playing: Mutex<Option<serde_json::Value>>,
}

pub struct MockUpstream {
    pub base_url: String,
    pub state: Arc<UpstreamState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state = Arc::new(UpstreamState::default());

        let app = Router::new()
            .route("/accounts/api/token", post(token))
            .route("/spotify/tracks/{id}", get(spotify_track))
            .route("/spotify/playlists/{id}/tracks", get(spotify_playlist_tracks))
            .route("/spotify/me/player/currently-playing", get(currently_playing))
            .route("/mb/recording", get(mb_search))
            .route("/mb/recording/{id}", get(mb_recording))
            .route("/mb/release/{id}", get(mb_release))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let port = listener
            .local_addr()
            .expect("Failed to get mock upstream address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock upstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn spotify_api_url(&self) -> String {
        format!("{}/spotify", self.base_url)
    }

    pub fn accounts_url(&self) -> String {
        format!("{}/accounts", self.base_url)
    }

    pub fn musicbrainz_url(&self) -> String {
        format!("{}/mb", self.base_url)
    }

    pub fn musicbrainz_requests(&self) -> usize {
        self.state.musicbrainz_requests.load(Ordering::SeqCst)
    }

    pub fn spotify_requests(&self) -> usize {
        self.state.spotify_requests.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn fail_musicbrainz_times(&self, times: usize) {
        self.state
            .musicbrainz_unavailable
            .store(times, Ordering::SeqCst);
    }

    pub fn reject_next_api_call(&self) {
        self.state.reject_next_api_call.store(1, Ordering::SeqCst);
    }

    pub fn set_now_playing(&self, body: Option<serde_json::Value>) {
        *self.state.now_playing.lock().unwrap() = body;
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Checks the app token. Returns the rejection to send when it is wrong.
fn check_app_token(state: &UpstreamState, headers: &HeaderMap) -> Option<Response> {
    state.spotify_requests.fetch_add(1, Ordering::SeqCst);
    let rejected = state
        .reject_next_api_call
        .compare_exchange(1, 0, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();
    if rejected || bearer(headers) != Some(APP_TOKEN) {
        return Some(StatusCode::UNAUTHORIZED.into_response());
    }
    None
}

async fn token(State(state): State<Arc<UpstreamState>>, headers: HeaderMap) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    let is_basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !is_basic {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "access_token": APP_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

async fn spotify_track(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_app_token(&state, &headers) {
        return rejection;
    }
    match fixtures::spotify_track_by_id(&id) {
        Some(track) => Json(track).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    limit: usize,
    offset: usize,
}

async fn spotify_playlist_tracks(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_app_token(&state, &headers) {
        return rejection;
    }
    if id != PLAYLIST_ID {
        return StatusCode::NOT_FOUND.into_response();
    }
    let items: Vec<_> = fixtures::playlist_items()
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();
    Json(json!({
        "items": items,
        "total": PLAYLIST_TOTAL,
        "limit": page.limit,
        "offset": page.offset
    }))
    .into_response()
}

async fn currently_playing(State(state): State<Arc<UpstreamState>>, headers: HeaderMap) -> Response {
    if bearer(&headers) != Some(USER_TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.now_playing.lock().unwrap().clone() {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Counts the request and decides whether to answer 503.
fn musicbrainz_gate(state: &UpstreamState, headers: &HeaderMap) -> Option<Response> {
    state.musicbrainz_requests.fetch_add(1, Ordering::SeqCst);
    if headers.get(header::USER_AGENT).is_none() {
        return Some(StatusCode::FORBIDDEN.into_response());
    }
    let unavailable = state
        .musicbrainz_unavailable
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    unavailable.then(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "0")],
            "rate limited",
        )
            .into_response()
    })
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
    fmt: String,
}

async fn mb_search(
    State(state): State<Arc<UpstreamState>>,
    Query(search): Query<SearchQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = musicbrainz_gate(&state, &headers) {
        return response;
    }
    if search.fmt != "json" {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(fixtures::recording_search(&search.query)).into_response()
}

async fn mb_recording(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = musicbrainz_gate(&state, &headers) {
        return response;
    }
    match fixtures::recording_with_relations(&id) {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn mb_release(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = musicbrainz_gate(&state, &headers) {
        return response;
    }
    match fixtures::release(&id) {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
