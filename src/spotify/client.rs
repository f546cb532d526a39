//! Spotify Web API client using the client-credentials flow.

use super::models::{CurrentlyPlayingDto, PlaylistTracksDto, TokenResponse, TrackDto};
use super::{
    ResourceKind, SpotifyResource, StreamingError, StreamingPage, StreamingProvider,
    StreamingTrack, ALBUMS_UNSUPPORTED, PLAYLIST_FETCH_FAILED,
};
use crate::server::metrics::record_upstream_call;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub timeout_sec: u64,
}

impl SpotifyClientConfig {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            api_base_url: "https://api.spotify.com/v1".to_string(),
            accounts_base_url: "https://accounts.spotify.com".to_string(),
            timeout_sec: 30,
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    client: reqwest::Client,
    config: SpotifyClientConfig,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .context("Failed to create Spotify HTTP client")?;

        let config = SpotifyClientConfig {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            accounts_base_url: config.accounts_base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid app token, requesting a new one when the cached one is
    /// missing or about to expire.
    async fn access_token(&self) -> Result<String, StreamingError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref() {
            if Instant::now() + TOKEN_SAFETY_MARGIN < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        debug!("Requesting new Spotify access token");
        let url = format!("{}/api/token", self.config.accounts_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| unavailable("token request failed", e))?;

        if !response.status().is_success() {
            record_upstream_call("spotify", "error");
            return Err(StreamingError::Unavailable(format!(
                "Spotify token refresh failed with status {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| unavailable("unreadable token response", e))?;
        record_upstream_call("spotify", "ok");

        let value = body.access_token.clone();
        *token = Some(CachedToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StreamingError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| unavailable("request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            record_upstream_call("spotify", "error");
            if status == StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
            }
            if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
                return Err(StreamingError::InvalidResource(format!(
                    "Spotify could not find {}",
                    url.rsplit('/').next().unwrap_or(url)
                )));
            }
            return Err(StreamingError::Unavailable(format!(
                "Spotify request failed with status {}",
                status
            )));
        }

        record_upstream_call("spotify", "ok");
        response
            .json()
            .await
            .map_err(|e| unavailable("unreadable response", e))
    }

    async fn fetch_track(&self, id: &str) -> Result<StreamingTrack, StreamingError> {
        let url = format!("{}/tracks/{}", self.config.api_base_url, id);
        let dto: TrackDto = self.get_json(&url, &[]).await?;
        dto.into_streaming_track().ok_or_else(|| {
            StreamingError::InvalidResource(format!("Track {} has no Spotify id", id))
        })
    }

    async fn fetch_playlist_page(
        &self,
        id: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<StreamingPage, StreamingError> {
        let url = format!("{}/playlists/{}/tracks", self.config.api_base_url, id);
        let offset = page_index
            .saturating_sub(1)
            .checked_mul(page_size)
            .ok_or_else(|| {
                StreamingError::InvalidResource(format!(
                    "Page {} of size {} is out of range",
                    page_index, page_size
                ))
            })?;
        let query = [
            ("limit", page_size.to_string()),
            ("offset", offset.to_string()),
        ];

        let dto: PlaylistTracksDto = self.get_json(&url, &query).await.map_err(|e| {
            warn!("Failed to fetch playlist {} at offset {}: {}", id, offset, e);
            StreamingError::Unavailable(PLAYLIST_FETCH_FAILED.to_string())
        })?;

        let tracks = dto
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(TrackDto::into_streaming_track)
            .collect();

        Ok(StreamingPage {
            tracks,
            total_count: dto.total,
        })
    }
}

fn unavailable(what: &str, err: reqwest::Error) -> StreamingError {
    record_upstream_call("spotify", "error");
    warn!("Spotify {}: {}", what, err);
    StreamingError::Unavailable(format!("Spotify {}", what))
}

#[async_trait]
impl StreamingProvider for SpotifyClient {
    async fn resolve_page(
        &self,
        resource_url: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<StreamingPage, StreamingError> {
        let resource = SpotifyResource::parse(resource_url)?;
        match resource.kind {
            ResourceKind::Track => {
                let track = self.fetch_track(&resource.id).await?;
                Ok(StreamingPage {
                    tracks: vec![track],
                    total_count: 1,
                })
            }
            ResourceKind::Album => Err(StreamingError::Unsupported(ALBUMS_UNSUPPORTED.to_string())),
            ResourceKind::Playlist => {
                self.fetch_playlist_page(&resource.id, page_index, page_size)
                    .await
            }
        }
    }

    async fn currently_playing(&self, user_token: &str) -> Result<Option<String>, StreamingError> {
        let url = format!("{}/me/player/currently-playing", self.config.api_base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await
            .map_err(|e| unavailable("player request failed", e))?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                record_upstream_call("spotify", "ok");
                return Ok(None);
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                record_upstream_call("spotify", "error");
                return Err(StreamingError::Unauthorized);
            }
            status if !status.is_success() => {
                record_upstream_call("spotify", "error");
                return Err(StreamingError::Unavailable(format!(
                    "Spotify player request failed with status {}",
                    status
                )));
            }
            _ => {}
        }

        record_upstream_call("spotify", "ok");
        let playing: CurrentlyPlayingDto = response
            .json()
            .await
            .map_err(|e| unavailable("unreadable player response", e))?;

        // Podcasts and ads carry no track to score.
        if playing.currently_playing_type.as_deref().unwrap_or("track") != "track" {
            return Ok(None);
        }
        Ok(playing
            .item
            .and_then(|item| item.id)
            .map(|id| SpotifyResource::track_url(&id)))
    }
}
