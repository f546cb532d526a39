//! Page orchestration: streaming page -> attribution -> score -> response.
//!
//! Tracks are processed one at a time, in provider order, so the metadata
//! throttle sees a steady stream of calls. A failure on one track degrades
//! that track only. Cache failures and streaming-provider failures abort the
//! whole page.

use crate::blacklist::BlacklistSource;
use crate::gateway::CacheError;
use crate::musicbrainz::{MetadataError, MetadataResolver};
use crate::scoring::{choose_score, FinalScore, ScoreBasis};
use crate::server::metrics::record_track_scored;
use crate::spotify::{StreamingError, StreamingProvider, StreamingTrack};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const TRACK_ERROR_MESSAGE: &str = "Error fetching details";
pub const PAGE_SUCCESS_MESSAGE: &str = "Tracks successfully retrieved";

fn default_page_index() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(alias = "spotifyUrl")]
    pub resource_url: String,
    #[serde(default = "default_page_index", alias = "page")]
    pub page_index: u32,
    #[serde(default = "default_page_size", alias = "limit")]
    pub page_size: u32,
}

impl PageRequest {
    pub fn first_page(resource_url: impl Into<String>) -> Self {
        Self {
            resource_url: resource_url.into(),
            page_index: default_page_index(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTrack {
    #[serde(flatten)]
    pub track: StreamingTrack,
    pub score: Option<FinalScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_basis: Option<ScoreBasis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub tracks: Vec<ScoredTrack>,
    pub count: usize,
    pub total_score: u32,
    pub page_size: u32,
    #[serde(rename = "totalTracks")]
    pub total_count: u32,
    pub page_index: u32,
    pub has_more: bool,
    pub skipped_count: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to load blacklist: {0:#}")]
    Blacklist(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_page_size: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { max_page_size: 50 }
    }
}

pub struct TrackPipeline {
    provider: Arc<dyn StreamingProvider>,
    resolver: Arc<dyn MetadataResolver>,
    blacklist: Arc<dyn BlacklistSource>,
    settings: PipelineSettings,
}

impl TrackPipeline {
    pub fn new(
        provider: Arc<dyn StreamingProvider>,
        resolver: Arc<dyn MetadataResolver>,
        blacklist: Arc<dyn BlacklistSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            resolver,
            blacklist,
            settings,
        }
    }

    pub fn provider(&self) -> &Arc<dyn StreamingProvider> {
        &self.provider
    }

    fn validate(&self, request: &PageRequest) -> Result<(), PipelineError> {
        if request.page_index < 1 {
            return Err(PipelineError::InvalidRequest(
                "pageIndex must be at least 1".to_string(),
            ));
        }
        if request.page_size < 1 || request.page_size > self.settings.max_page_size {
            return Err(PipelineError::InvalidRequest(format!(
                "pageSize must be between 1 and {}",
                self.settings.max_page_size
            )));
        }
        Ok(())
    }

    /// Scores one page of the resource named by `request`.
    pub async fn score_page(&self, request: &PageRequest) -> Result<PageResult, PipelineError> {
        self.validate(request)?;
        let config = self.blacklist.load().map_err(PipelineError::Blacklist)?;

        let page = self
            .provider
            .resolve_page(&request.resource_url, request.page_index, request.page_size)
            .await?;
        debug!(
            "Fetched {} tracks ({} total) for {}",
            page.tracks.len(),
            page.total_count,
            request.resource_url
        );

        let mut tracks = Vec::with_capacity(page.tracks.len());
        let mut skipped_count = 0;
        for track in page.tracks {
            if track.isrc.is_none() {
                debug!("Skipping track {} without ISRC", track.id);
                skipped_count += 1;
                continue;
            }

            let scored = match self.resolver.resolve(&track).await {
                Ok(attribution) => {
                    let (score, basis) = choose_score(attribution.as_ref(), &track, &config);
                    record_track_scored(basis.as_str());
                    ScoredTrack {
                        track,
                        score: Some(score),
                        score_basis: Some(basis),
                        error: None,
                    }
                }
                Err(MetadataError::Cache(err)) => return Err(err.into()),
                Err(err) => {
                    warn!("Failed to resolve track {}: {}", track.id, err);
                    ScoredTrack {
                        track,
                        score: None,
                        score_basis: None,
                        error: Some(TRACK_ERROR_MESSAGE.to_string()),
                    }
                }
            };
            tracks.push(scored);
        }

        let total_score = tracks
            .iter()
            .filter_map(|t| t.score.as_ref())
            .map(|s| s.total)
            .sum();
        let has_more = request.page_index.saturating_mul(request.page_size) < page.total_count;
        let message = if skipped_count > 0 {
            format!(
                "{}. {} track(s) without an ISRC could not be checked and were skipped.",
                PAGE_SUCCESS_MESSAGE, skipped_count
            )
        } else {
            PAGE_SUCCESS_MESSAGE.to_string()
        };

        info!(
            "Scored page {} of {}: {} tracks, total score {}, {} skipped",
            request.page_index,
            request.resource_url,
            tracks.len(),
            total_score,
            skipped_count
        );

        Ok(PageResult {
            count: tracks.len(),
            tracks,
            total_score,
            page_size: request.page_size,
            total_count: page.total_count,
            page_index: request.page_index,
            has_more,
            skipped_count,
            message,
        })
    }
}
