//! Canonical contributor attribution from MusicBrainz.

mod client;
mod dto;
mod release;
mod resolver;
mod retry_policy;

pub use client::{MusicBrainzClient, MusicBrainzConfig};
pub use release::{normalize_date, select_closest_release};
pub use resolver::{normalize_title, MusicBrainzResolver};
pub use retry_policy::RetryPolicy;

use crate::gateway::CacheError;
use crate::spotify::StreamingTrack;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
}

/// Artists credited through one relationship type (e.g. "composer").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Involvement {
    pub role: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAttribution {
    pub title: String,
    pub main_artist: Entity,
    pub features: Vec<Entity>,
    pub producers: Vec<Entity>,
    pub labels: Vec<Entity>,
    pub involvement: Vec<Involvement>,
    #[serde(default)]
    pub closest_release_date: Option<String>,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("MusicBrainz is rate limiting requests (gave up after {attempts} attempts)")]
    RateLimited { attempts: u32 },

    #[error("MusicBrainz unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected MusicBrainz response: {0}")]
    Parse(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Full attribution for `track`, or `None` when no recording or release
    /// matches.
    async fn resolve(
        &self,
        track: &StreamingTrack,
    ) -> Result<Option<ResolvedAttribution>, MetadataError>;
}
