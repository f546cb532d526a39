use super::{FinalScore, Role, ScoreDetail, ScoringConfig};
use crate::spotify::StreamingTrack;

/// Degraded scoring from streaming-provider names only.
///
/// The first contributor counts as main artist and the rest as features.
/// Names are compared case-insensitively against `artist` and `feature`
/// entries.
pub fn score_from_raw_track(track: &StreamingTrack, config: &ScoringConfig) -> FinalScore {
    let Some((main_artist, features)) = track.contributors.split_first() else {
        return FinalScore::zero();
    };

    let mut details = Vec::new();
    for entry in &config.entries {
        let matches = |name: &String| name.to_lowercase() == entry.name.to_lowercase();
        match entry.role {
            Role::Artist if matches(main_artist) => details.push(ScoreDetail {
                reason: Role::Artist.reason(main_artist),
                weight: entry.weight,
                role: Role::Artist,
            }),
            Role::Feature if features.iter().any(matches) => details.push(ScoreDetail {
                reason: Role::Feature.reason(&entry.name),
                weight: entry.weight,
                role: Role::Feature,
            }),
            _ => {}
        }
    }

    FinalScore::from_details(details)
}
