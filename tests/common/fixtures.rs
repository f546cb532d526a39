//! JSON bodies served by the mock upstream services.

use super::constants::*;
use serde_json::{json, Value};

pub fn spotify_track(id: &str, title: &str, artists: &[&str], isrc: Option<&str>) -> Value {
    let artists: Vec<Value> = artists.iter().map(|name| json!({ "name": name })).collect();
    let external_ids = match isrc {
        Some(isrc) => json!({ "isrc": isrc }),
        None => json!({}),
    };
    json!({
        "id": id,
        "name": title,
        "artists": artists,
        "album": { "name": "Fixture Album", "release_date": "2001-07-10" },
        "external_ids": external_ids,
    })
}

/// Track bodies the mock serves at `/tracks/{id}`.
pub fn spotify_track_by_id(id: &str) -> Option<Value> {
    let track = match id {
        DIDDY_TRACK_ID => {
            let mut track = spotify_track(
                DIDDY_TRACK_ID,
                DIDDY_TRACK_TITLE,
                &["Diddy", "Black Rob", "Mark Curry"],
                Some(DIDDY_TRACK_ISRC),
            );
            track["album"]["name"] = json!("The Saga Continues...");
            track
        }
        CLEAN_TRACK_ID => spotify_track(
            CLEAN_TRACK_ID,
            "Clean Song (feat. Nobody)",
            &["Someone Else"],
            Some("GBAAA0000001"),
        ),
        RAW_DIDDY_TRACK_ID => spotify_track(
            RAW_DIDDY_TRACK_ID,
            "Unknown Remix",
            &["Some DJ", "diddy"],
            Some("GBAAA0000002"),
        ),
        LOCAL_TRACK_ID => spotify_track(LOCAL_TRACK_ID, "Home Demo", &["Someone Else"], None),
        _ => return None,
    };
    Some(track)
}

/// All playlist items, in order. Index 2 is a removed track.
pub fn playlist_items() -> Vec<Value> {
    (0..PLAYLIST_TOTAL as usize)
        .map(|index| match index {
            0 => json!({ "track": spotify_track_by_id(DIDDY_TRACK_ID) }),
            1 => json!({ "track": spotify_track_by_id(LOCAL_TRACK_ID) }),
            2 => json!({ "track": null }),
            n => json!({
                "track": spotify_track(
                    &format!("clean{}", n),
                    &format!("Clean Song {}", n),
                    &["Someone Else"],
                    Some(&format!("GBCLN00000{:02}", n)),
                )
            }),
        })
        .collect()
}

/// Search query the resolver sends for the Diddy track when its ISRC is unknown.
pub fn diddy_metadata_query() -> String {
    format!(
        "recording:\"{}\" AND artist:\"Diddy\" AND release:\"The Saga Continues...\"",
        DIDDY_TRACK_TITLE
    )
}

/// Answers the Diddy track's ISRC search and its metadata search.
pub fn recording_search(query: &str) -> Value {
    if query == format!("isrc:{}", DIDDY_TRACK_ISRC) || query == diddy_metadata_query() {
        json!({
            "count": 1,
            "recordings": [{
                "id": RECORDING_ID,
                "title": DIDDY_TRACK_TITLE,
                "artist-credit": [
                    { "name": "Diddy", "artist": { "id": DIDDY_MBID, "name": "Diddy" } },
                    { "name": "Black Rob", "artist": { "id": "black-rob", "name": "Black Rob" } },
                    { "name": "Mark Curry", "artist": { "id": "mark-curry", "name": "Mark Curry" } }
                ],
                "releases": [
                    { "id": "rel-bootleg", "title": "The Saga Continues...", "date": "2001-07-10", "status": "Bootleg" },
                    { "id": RELEASE_ID, "title": "The Saga Continues...", "date": "2001-07-10", "status": "Official" }
                ]
            }]
        })
    } else {
        json!({ "count": 0, "recordings": [] })
    }
}

pub fn recording_with_relations(id: &str) -> Option<Value> {
    (id == RECORDING_ID).then(|| {
        json!({
            "id": RECORDING_ID,
            "title": DIDDY_TRACK_TITLE,
            "relations": [
                { "type": "producer", "artist": { "id": "yogi", "name": "Yogi" } },
                { "type": "vocal", "artist": { "id": "black-rob", "name": "Black Rob" } }
            ]
        })
    })
}

pub fn release(id: &str) -> Option<Value> {
    (id == RELEASE_ID).then(|| {
        json!({
            "id": RELEASE_ID,
            "title": "The Saga Continues...",
            "date": "2001-07-10",
            "artist-credit": [
                { "name": "Diddy", "artist": { "id": DIDDY_MBID, "name": "Diddy" } }
            ],
            "label-info": [
                { "catalog-number": "78612-73045-2", "label": { "id": BAD_BOY_RECORDS_MBID, "name": "Bad Boy Records" } }
            ]
        })
    })
}
