use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;

use super::involvements::INVOLVEMENTS;
use super::metrics::{metrics_handler, set_cache_entries};
use super::{log_requests, state::*, ServerConfig};
use crate::gateway::GatewayStats;
use crate::pipeline::{PageRequest, PipelineError};
use crate::spotify::StreamingError;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayStats>,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Streaming(StreamingError::InvalidResource(_))
            | PipelineError::Streaming(StreamingError::Unsupported(_)) => StatusCode::BAD_REQUEST,
            PipelineError::Streaming(StreamingError::Unauthorized) => StatusCode::UNAUTHORIZED,
            PipelineError::Streaming(StreamingError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            PipelineError::Cache(_) | PipelineError::Blacklist(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        error_response(status, self.to_string())
    }
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let gateway = match state.gateway.stats().await {
        Ok(stats) => Some(stats),
        Err(err) => {
            warn!("Could not read gateway stats: {:#}", err);
            None
        }
    };
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        gateway,
    })
}

async fn post_score(
    State(pipeline): State<GuardedPipeline>,
    body: Result<Json<PageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match pipeline.score_page(&request).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_now_playing(State(pipeline): State<GuardedPipeline>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Missing bearer token");
    };

    let track_url = match pipeline.provider().currently_playing(token).await {
        Ok(Some(url)) => url,
        Ok(None) => return StatusCode::NO_CONTENT.into_response(),
        Err(err) => return PipelineError::from(err).into_response(),
    };
    debug!("Now playing: {}", track_url);

    match pipeline.score_page(&PageRequest::first_page(track_url)).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_blacklist(State(blacklist): State<GuardedBlacklistSource>) -> Response {
    match blacklist.load() {
        Ok(config) => Json(config).into_response(),
        Err(err) => PipelineError::Blacklist(err).into_response(),
    }
}

async fn get_involvements() -> impl IntoResponse {
    Json(INVOLVEMENTS)
}

async fn get_metrics(State(gateway): State<GuardedGateway>) -> impl IntoResponse {
    match gateway.stats().await {
        Ok(stats) => set_cache_entries(stats.cached_entries),
        Err(err) => warn!("Could not refresh cache entries gauge: {:#}", err),
    }
    metrics_handler().await
}

pub fn make_app(config: ServerConfig, state: ServerState) -> Router {
    let api_routes: Router = Router::new()
        .route("/score", post(post_score))
        .route("/now-playing", get(get_now_playing))
        .route("/blacklist", get(get_blacklist))
        .route("/involvements", get(get_involvements))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app(gateway: GuardedGateway) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(gateway)
}

pub async fn run_server(config: ServerConfig, state: ServerState) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, state.clone());
    let metrics_app = make_metrics_app(state.gateway.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result.context("Server stopped"),
        result = axum::serve(metrics_listener, metrics_app).into_future() => result.context("Metrics server stopped"),
    }
}
