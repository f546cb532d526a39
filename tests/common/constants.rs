//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When upstream fixture data changes, update only this file.

use std::time::Duration;

// ============================================================================
// Credentials
// ============================================================================

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";

/// Token handed out by the mock accounts service
pub const APP_TOKEN: &str = "mock-app-token";

/// User token accepted by the mock player endpoint
pub const USER_TOKEN: &str = "mock-user-token";

// ============================================================================
// Spotify fixtures
// ============================================================================

/// "Bad Boy for Life", credited to Diddy on Bad Boy Records
pub const DIDDY_TRACK_ID: &str = "diddytrack1";
pub const DIDDY_TRACK_ISRC: &str = "USBB10100001";
pub const DIDDY_TRACK_TITLE: &str = "Bad Boy for Life";

/// A track MusicBrainz knows nothing about, by an unlisted artist
pub const CLEAN_TRACK_ID: &str = "cleantrack1";

/// A track MusicBrainz knows nothing about, with Diddy as a listed contributor
pub const RAW_DIDDY_TRACK_ID: &str = "rawdiddy1";

/// A track without an ISRC
pub const LOCAL_TRACK_ID: &str = "localtrack1";

/// A 45-item playlist: the Diddy track, a track without ISRC, a removed
/// (null) item, then clean tracks
pub const PLAYLIST_ID: &str = "playlist45";
pub const PLAYLIST_TOTAL: u32 = 45;

/// A playlist the mock refuses to serve
pub const BROKEN_PLAYLIST_ID: &str = "brokenplaylist";

// ============================================================================
// MusicBrainz fixtures
// ============================================================================

pub const DIDDY_MBID: &str = "cabb4fcf-4067-4ba5-908d-76ee66fcf0c6";
pub const BAD_BOY_RECORDS_MBID: &str = "29d43312-a8ed-4d7b-9f4e-f5650318aebb";
pub const RECORDING_ID: &str = "rec-bad-boy-for-life";
pub const RELEASE_ID: &str = "rel-saga-continues";

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Backoff used by the test MusicBrainz client so retries stay fast
pub const TEST_INITIAL_BACKOFF: Duration = Duration::from_millis(10);

pub fn track_url(id: &str) -> String {
    format!("https://open.spotify.com/track/{}", id)
}

pub fn playlist_url(id: &str) -> String {
    format!("https://open.spotify.com/playlist/{}", id)
}
