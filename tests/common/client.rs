//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// POST /v1/score with an arbitrary JSON body
    pub async fn score_raw(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/score", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Score request failed")
    }

    pub async fn score(&self, resource_url: &str) -> Response {
        self.score_raw(json!({ "resourceUrl": resource_url })).await
    }

    pub async fn score_page(&self, resource_url: &str, page_index: u32, page_size: u32) -> Response {
        self.score_raw(json!({
            "resourceUrl": resource_url,
            "pageIndex": page_index,
            "pageSize": page_size,
        }))
        .await
    }

    pub async fn now_playing(&self, user_token: Option<&str>) -> Response {
        let mut request = self
            .client
            .get(format!("{}/v1/now-playing", self.base_url));
        if let Some(token) = user_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Now playing request failed")
    }

    pub async fn blacklist(&self) -> Response {
        self.client
            .get(format!("{}/v1/blacklist", self.base_url))
            .send()
            .await
            .expect("Blacklist request failed")
    }

    pub async fn involvements(&self) -> Response {
        self.client
            .get(format!("{}/v1/involvements", self.base_url))
            .send()
            .await
            .expect("Involvements request failed")
    }
}
