use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all Diddymeter metrics
const PREFIX: &str = "diddymeter";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Lookup cache
    pub static ref CACHE_LOOKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_cache_lookups_total"), "Cache lookups by result"),
        &["result"]
    ).expect("Failed to create cache_lookups_total metric");

    pub static ref CACHE_ENTRIES: Gauge = Gauge::new(
        format!("{PREFIX}_cache_entries"),
        "Number of entries in the lookup cache"
    ).expect("Failed to create cache_entries metric");

    // Outbound calls
    pub static ref UPSTREAM_CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_calls_total"), "Outbound calls by service and outcome"),
        &["service", "outcome"]
    ).expect("Failed to create upstream_calls_total metric");

    pub static ref THROTTLE_WAIT_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_throttle_wait_seconds"),
            "Time spent waiting on the outbound throttle"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0])
    ).expect("Failed to create throttle_wait_seconds metric");

    // Scoring
    pub static ref TRACKS_SCORED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_tracks_scored_total"), "Tracks scored by score basis"),
        &["basis"]
    ).expect("Failed to create tracks_scored_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already registered is fine (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_LOOKUPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_ENTRIES.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(THROTTLE_WAIT_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(TRACKS_SCORED_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a cache lookup, `result` is "hit" or "miss"
pub fn record_cache_lookup(result: &str) {
    CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

pub fn set_cache_entries(count: usize) {
    CACHE_ENTRIES.set(count as f64);
}

/// Record an outbound call to `service` ("spotify", "musicbrainz")
pub fn record_upstream_call(service: &str, outcome: &str) {
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[service, outcome])
        .inc();
}

pub fn record_throttle_wait(wait: Duration) {
    THROTTLE_WAIT_SECONDS.observe(wait.as_secs_f64());
}

pub fn record_track_scored(basis: &str) {
    TRACKS_SCORED_TOTAL.with_label_values(&[basis]).inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
