use super::StreamingError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref SPOTIFY_URL: Regex = Regex::new(
        r"https?://open\.spotify\.com/(?:intl-\w+/)?(track|album|playlist)/([a-zA-Z0-9]+)"
    )
    .expect("Spotify URL pattern must compile");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Track,
    Album,
    Playlist,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Track => "track",
            ResourceKind::Album => "album",
            ResourceKind::Playlist => "playlist",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyResource {
    pub kind: ResourceKind,
    pub id: String,
}

impl SpotifyResource {
    /// Parses an `open.spotify.com` link. Query strings and locale prefixes
    /// (`/intl-de/`) are accepted.
    pub fn parse(url: &str) -> Result<Self, StreamingError> {
        let captures = SPOTIFY_URL
            .captures(url)
            .ok_or_else(|| StreamingError::InvalidResource("Invalid Spotify URL".to_string()))?;

        let kind = match &captures[1] {
            "track" => ResourceKind::Track,
            "album" => ResourceKind::Album,
            _ => ResourceKind::Playlist,
        };

        Ok(Self {
            kind,
            id: captures[2].to_string(),
        })
    }

    pub fn track_url(id: &str) -> String {
        format!("https://open.spotify.com/track/{}", id)
    }
}
