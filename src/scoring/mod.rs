//! Blacklist scoring.
//!
//! Two tiers exist. [`score_from_attribution`] matches canonical contributor
//! identifiers against the blacklist by id and role. [`score_from_raw_track`]
//! is the degraded tier that compares raw streaming-provider names instead.
//! [`choose_score`] applies the policy between them and reports which tier won.

mod attribution;
mod raw_track;

pub use attribution::score_from_attribution;
pub use raw_track::score_from_raw_track;

use crate::musicbrainz::ResolvedAttribution;
use crate::spotify::StreamingTrack;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Artist,
    Producer,
    Composer,
    Mix,
    Vocal,
    Feature,
    Label,
    Default,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Artist,
        Role::Producer,
        Role::Composer,
        Role::Mix,
        Role::Vocal,
        Role::Feature,
        Role::Label,
        Role::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artist => "artist",
            Role::Producer => "producer",
            Role::Composer => "composer",
            Role::Mix => "mix",
            Role::Vocal => "vocal",
            Role::Feature => "feature",
            Role::Label => "label",
            Role::Default => "default",
        }
    }

    /// Explanation shown to users for a blacklisted `name` matched in this role.
    pub fn reason(&self, name: &str) -> String {
        match self {
            Role::Artist => format!("{} is the main artist of this track", name),
            Role::Feature => format!("{} is featured on this track", name),
            Role::Producer => format!("{} produced this track", name),
            Role::Composer => format!("{} composed this track", name),
            Role::Mix => format!("{} mixed this track", name),
            Role::Vocal => format!("{} provided vocals on this track", name),
            Role::Label => format!("{} is a label of this track's release", name),
            Role::Default => format!("{} is credited on this track", name),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown role '{}'", s))
    }
}

/// A blacklisted entity in one role. The same id may appear once per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub weight: u32,
}

/// Default weight per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleWeights(BTreeMap<Role, u32>);

impl RoleWeights {
    pub fn new(weights: BTreeMap<Role, u32>) -> Self {
        Self(weights)
    }

    pub fn get(&self, role: Role) -> Option<u32> {
        self.0.get(&role).copied()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains_key(&role)
    }

    /// Role under which a MusicBrainz relation type is scored.
    pub fn role_for_relation(&self, relation_type: &str) -> Role {
        match relation_type.parse::<Role>() {
            Ok(role) if self.contains(role) => role,
            _ => Role::Default,
        }
    }
}

impl Default for RoleWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Role::Artist, 50),
            (Role::Label, 25),
            (Role::Producer, 15),
            (Role::Composer, 15),
            (Role::Mix, 8),
            (Role::Vocal, 5),
            (Role::Feature, 10),
            (Role::Default, 5),
        ]))
    }
}

/// Blacklist and weights as loaded for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub entries: Vec<BlacklistEntry>,
    pub weights: RoleWeights,
}

impl ScoringConfig {
    fn find(&self, id: &str, role: Role) -> Option<&BlacklistEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id == id && entry.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub reason: String,
    pub weight: u32,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreLevel {
    Zero,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ScoreLevel {
    pub fn from_total(total: u32) -> Self {
        match total {
            0 => ScoreLevel::Zero,
            1..=9 => ScoreLevel::Low,
            10..=24 => ScoreLevel::Medium,
            25..=50 => ScoreLevel::High,
            _ => ScoreLevel::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub total: u32,
    pub details: Vec<ScoreDetail>,
    pub level: ScoreLevel,
}

impl FinalScore {
    /// Drops details whose reason was already seen and sums the rest.
    pub fn from_details(details: impl IntoIterator<Item = ScoreDetail>) -> Self {
        let mut seen = HashSet::new();
        let details: Vec<ScoreDetail> = details
            .into_iter()
            .filter(|detail| seen.insert(detail.reason.clone()))
            .collect();
        let total = details.iter().map(|detail| detail.weight).sum();
        Self {
            total,
            details,
            level: ScoreLevel::from_total(total),
        }
    }

    pub fn zero() -> Self {
        Self::from_details(Vec::new())
    }
}

/// Which tier produced a track's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBasis {
    Attribution,
    RawTrack,
}

impl ScoreBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBasis::Attribution => "attribution",
            ScoreBasis::RawTrack => "rawTrack",
        }
    }
}

/// Attribution score when it is positive, the raw-track score otherwise.
pub fn choose_score(
    attribution: Option<&ResolvedAttribution>,
    track: &StreamingTrack,
    config: &ScoringConfig,
) -> (FinalScore, ScoreBasis) {
    if let Some(attribution) = attribution {
        let score = score_from_attribution(attribution, config);
        if score.total > 0 {
            return (score, ScoreBasis::Attribution);
        }
    }
    (score_from_raw_track(track, config), ScoreBasis::RawTrack)
}
