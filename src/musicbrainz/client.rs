//! MusicBrainz WS/2 client.
//!
//! Every request goes through the shared gateway throttle. Responses with
//! status 503 or 429 are retried per [`RetryPolicy`]; every other failure is
//! returned at once.

use super::dto::{RecordingDto, RecordingSearchDto, ReleaseDto};
use super::retry_policy::{parse_retry_after, RetryPolicy};
use super::MetadataError;
use crate::gateway::CacheGateway;
use crate::server::metrics::record_upstream_call;
use anyhow::Context;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct MusicBrainzConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_sec: u64,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: concat!("diddymeter-server/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_sec: 30,
        }
    }
}

enum Attempt<T> {
    Done(T),
    RateLimited(Option<Duration>),
}

pub struct MusicBrainzClient {
    client: reqwest::Client,
    base_url: String,
    retry_policy: RetryPolicy,
    gateway: Arc<CacheGateway>,
}

impl MusicBrainzClient {
    pub fn new(
        config: MusicBrainzConfig,
        retry_policy: RetryPolicy,
        gateway: Arc<CacheGateway>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .context("Failed to create MusicBrainz HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_policy,
            gateway,
        })
    }

    /// Recordings matching a Lucene `query`, best match first.
    pub async fn search_recordings(&self, query: &str) -> Result<Vec<RecordingDto>, MetadataError> {
        let url = format!("{}/recording", self.base_url);
        let key = format!("mb-search-{}", query);
        let search: RecordingSearchDto = self
            .gateway
            .cached(&key, || {
                self.get_json(&url, vec![("query", query.to_string()), ("fmt", "json".to_string())])
            })
            .await?;
        Ok(search.recordings)
    }

    /// A recording with its artist relationships.
    pub async fn recording_with_relations(&self, id: &str) -> Result<RecordingDto, MetadataError> {
        let url = format!("{}/recording/{}", self.base_url, id);
        self.gateway
            .cached(&format!("mb-recording-{}", id), || {
                self.get_json(
                    &url,
                    vec![("inc", "artist-rels".to_string()), ("fmt", "json".to_string())],
                )
            })
            .await
    }

    /// A release with its labels and artist credits.
    pub async fn release(&self, id: &str) -> Result<ReleaseDto, MetadataError> {
        let url = format!("{}/release/{}", self.base_url, id);
        self.gateway
            .cached(&format!("mb-release-{}", id), || {
                self.get_json(
                    &url,
                    vec![("inc", "labels+artists".to_string()), ("fmt", "json".to_string())],
                )
            })
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Vec<(&str, String)>,
    ) -> Result<T, MetadataError> {
        let mut attempt = 1;
        loop {
            let outcome = self
                .gateway
                .throttled(self.attempt_json(url, &query))
                .await?;

            let retry_after = match outcome {
                Attempt::Done(value) => return Ok(value),
                Attempt::RateLimited(retry_after) => retry_after,
            };

            if !self.retry_policy.should_retry(attempt) {
                warn!("MusicBrainz still rate limiting {} after {} attempts", url, attempt);
                return Err(MetadataError::RateLimited { attempts: attempt });
            }

            let delay = self.retry_policy.delay(attempt, retry_after);
            warn!(
                "MusicBrainz rate limited attempt {} for {}, retrying in {:?}",
                attempt, url, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Attempt<T>, MetadataError> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                record_upstream_call("musicbrainz", "error");
                MetadataError::Unavailable(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS {
            record_upstream_call("musicbrainz", "rate_limited");
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Ok(Attempt::RateLimited(retry_after));
        }
        if !status.is_success() {
            record_upstream_call("musicbrainz", "error");
            return Err(MetadataError::Unavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }

        record_upstream_call("musicbrainz", "ok");
        let body = response.text().await.map_err(|e| {
            MetadataError::Unavailable(format!("failed to read body of {}: {}", url, e))
        })?;
        serde_json::from_str(&body)
            .map(Attempt::Done)
            .map_err(|e| MetadataError::Parse(format!("{}: {}", url, e)))
    }
}
