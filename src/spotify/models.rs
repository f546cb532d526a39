//! Wire types of the Spotify Web API, trimmed to the fields we read.

use super::StreamingTrack;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub struct ArtistDto {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalIdsDto {
    #[serde(default)]
    pub isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackDto {
    /// Null for local files.
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistDto>,
    #[serde(default)]
    pub album: AlbumDto,
    #[serde(default)]
    pub external_ids: ExternalIdsDto,
}

impl TrackDto {
    /// `None` for items that cannot be looked up (local files).
    pub fn into_streaming_track(self) -> Option<StreamingTrack> {
        let id = self.id?;
        Some(StreamingTrack {
            id,
            title: self.name,
            contributors: self.artists.into_iter().map(|a| a.name).collect(),
            album: self.album.name,
            release_date: self.album.release_date.unwrap_or_default(),
            isrc: self.external_ids.isrc.filter(|isrc| !isrc.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemDto {
    #[serde(default)]
    pub track: Option<TrackDto>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTracksDto {
    #[serde(default)]
    pub items: Vec<PlaylistItemDto>,
    pub total: u32,
}

#[derive(Debug, Deserialize)]
pub struct CurrentlyPlayingDto {
    #[serde(default)]
    pub currently_playing_type: Option<String>,
    #[serde(default)]
    pub item: Option<PlayingItemDto>,
}

#[derive(Debug, Deserialize)]
pub struct PlayingItemDto {
    pub id: Option<String>,
}
