use super::{FinalScore, Role, ScoreDetail, ScoringConfig};
use crate::musicbrainz::{Entity, ResolvedAttribution};

fn match_entities<'a>(
    entities: &'a [Entity],
    role: Role,
    config: &'a ScoringConfig,
) -> impl Iterator<Item = ScoreDetail> + 'a {
    entities.iter().filter_map(move |entity| {
        config.find(&entity.id, role).map(|entry| ScoreDetail {
            reason: role.reason(&entity.name),
            weight: entry.weight,
            role,
        })
    })
}

/// Scores canonical attribution by exact id and role match.
///
/// Buckets are visited in a fixed order (main artist, features, producers,
/// labels, then involvement groups as listed), so the result is deterministic.
pub fn score_from_attribution(
    attribution: &ResolvedAttribution,
    config: &ScoringConfig,
) -> FinalScore {
    let involvement = attribution.involvement.iter().flat_map(move |group| {
        let role = config.weights.role_for_relation(&group.role);
        match_entities(&group.entities, role, config)
    });

    let main_artist = std::slice::from_ref(&attribution.main_artist);
    let details = match_entities(main_artist, Role::Artist, config)
        .chain(match_entities(&attribution.features, Role::Feature, config))
        .chain(match_entities(&attribution.producers, Role::Producer, config))
        .chain(match_entities(&attribution.labels, Role::Label, config))
        .chain(involvement);

    FinalScore::from_details(details)
}
