//! Streaming-provider side: turns a Spotify link into track descriptors.

mod client;
mod models;
mod resource;

pub use client::{SpotifyClient, SpotifyClientConfig};
pub use resource::{ResourceKind, SpotifyResource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ALBUMS_UNSUPPORTED: &str = "Currently the app doesn't support albums.";
pub const PLAYLIST_FETCH_FAILED: &str = "Failed to fetch playlist tracks. Most likely the playlist is too big. We're working on caching as much data as possible.";

/// One track as reported by the streaming provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingTrack {
    pub id: String,
    pub title: String,
    /// Artist names in provider order, main artist first.
    pub contributors: Vec<String>,
    pub album: String,
    pub release_date: String,
    #[serde(
        rename = "externalIsrc",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub isrc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StreamingPage {
    pub tracks: Vec<StreamingTrack>,
    pub total_count: u32,
}

#[derive(Debug, Error)]
pub enum StreamingError {
    #[error("{0}")]
    InvalidResource(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Spotify rejected the user credential")]
    Unauthorized,

    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Tracks of one page of `resource_url`. Single tracks ignore paging.
    async fn resolve_page(
        &self,
        resource_url: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<StreamingPage, StreamingError>;

    /// Link to the track the user is listening to, if any.
    async fn currently_playing(&self, user_token: &str) -> Result<Option<String>, StreamingError>;
}
