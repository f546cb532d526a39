//! Picking the release a streaming track most likely came from.

use super::dto::ReleaseSummaryDto;
use chrono::NaiveDate;

/// Parses a MusicBrainz partial date. `YYYY` and `YYYY-MM` count as the
/// first day of the year or month.
pub fn normalize_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    let full = match date.len() {
        4 => format!("{}-01-01", date),
        7 => format!("{}-01", date),
        _ => date.to_string(),
    };
    NaiveDate::parse_from_str(&full, "%Y-%m-%d").ok()
}

fn days_between(release: &ReleaseSummaryDto, target: Option<NaiveDate>) -> Option<i64> {
    let date = normalize_date(release.date.as_deref()?)?;
    Some((date - target?).num_days().abs())
}

/// Chooses among a recording's releases.
///
/// Releases titled like `album` (case-insensitive) win when any exist; within
/// those, official releases win when any exist. The release closest in days
/// to `target_date` is chosen, undated releases last, ties to the first one
/// listed.
pub fn select_closest_release<'a>(
    releases: &'a [ReleaseSummaryDto],
    album: &str,
    target_date: &str,
) -> Option<&'a ReleaseSummaryDto> {
    let mut candidates: Vec<&ReleaseSummaryDto> = releases.iter().collect();

    if !album.is_empty() {
        let same_album: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|r| r.title.to_lowercase() == album.to_lowercase())
            .collect();
        if !same_album.is_empty() {
            candidates = same_album;
        }
    }

    let official: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|r| {
            r.status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("official"))
        })
        .collect();
    if !official.is_empty() {
        candidates = official;
    }

    let target = normalize_date(target_date);
    let mut best: Option<(&ReleaseSummaryDto, Option<i64>)> = None;
    for release in candidates {
        let days = days_between(release, target);
        let closer = match (&best, days) {
            (None, _) => true,
            (Some((_, None)), Some(_)) => true,
            (Some((_, Some(best_days))), Some(days)) => days < *best_days,
            _ => false,
        };
        if closer {
            best = Some((release, days));
        }
    }
    best.map(|(release, _)| release)
}
