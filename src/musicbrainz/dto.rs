//! MusicBrainz WS/2 JSON shapes. Serialize is derived so lookups can be cached
//! in their wire form.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameIdDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCreditDto {
    #[serde(default)]
    pub name: String,
    pub artist: NameIdDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummaryDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDto {
    #[serde(rename = "type", default)]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub artist: Option<NameIdDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCreditDto>,
    #[serde(default)]
    pub releases: Vec<ReleaseSummaryDto>,
    #[serde(default)]
    pub relations: Vec<RelationDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSearchDto {
    #[serde(default)]
    pub recordings: Vec<RecordingDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelInfoDto {
    #[serde(default)]
    pub label: Option<NameIdDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCreditDto>,
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<LabelInfoDto>,
}
