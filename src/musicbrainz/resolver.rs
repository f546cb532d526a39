use super::client::MusicBrainzClient;
use super::dto::{ArtistCreditDto, NameIdDto, RecordingDto, RelationDto};
use super::release::select_closest_release;
use super::{Entity, Involvement, MetadataError, MetadataResolver, ResolvedAttribution};
use crate::gateway::CacheGateway;
use crate::spotify::StreamingTrack;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const PRODUCER_RELATION: &str = "producer";

/// Drops everything from the first `(` or `-`, which is where streaming
/// titles put "(feat. ...)" and "- Remastered".
pub fn normalize_title(title: &str) -> &str {
    let end = title.find(['(', '-']).unwrap_or(title.len());
    title[..end].trim()
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn metadata_query(track: &StreamingTrack) -> Option<String> {
    let artist = track.contributors.first()?;
    let mut query = format!(
        "recording:\"{}\" AND artist:\"{}\"",
        escape_query_value(normalize_title(&track.title)),
        escape_query_value(artist)
    );
    if !track.album.is_empty() {
        query.push_str(&format!(" AND release:\"{}\"", escape_query_value(&track.album)));
    }
    Some(query)
}

impl From<NameIdDto> for Entity {
    fn from(dto: NameIdDto) -> Self {
        Entity {
            id: dto.id,
            name: dto.name,
        }
    }
}

fn first_credited(credits: &[ArtistCreditDto]) -> Option<Entity> {
    credits.first().map(|credit| credit.artist.clone().into())
}

/// Groups relations by type in first-seen order. Producers are split out.
fn group_relations(relations: Vec<RelationDto>) -> (Vec<Entity>, Vec<Involvement>) {
    let mut producers = Vec::new();
    let mut involvement: Vec<Involvement> = Vec::new();

    for relation in relations {
        let (Some(role), Some(artist)) = (relation.relation_type, relation.artist) else {
            continue;
        };
        if role == PRODUCER_RELATION {
            producers.push(artist.into());
            continue;
        }
        match involvement.iter_mut().find(|group| group.role == role) {
            Some(group) => group.entities.push(artist.into()),
            None => involvement.push(Involvement {
                role,
                entities: vec![artist.into()],
            }),
        }
    }

    (producers, involvement)
}

pub struct MusicBrainzResolver {
    client: MusicBrainzClient,
    gateway: Arc<CacheGateway>,
}

impl MusicBrainzResolver {
    pub fn new(client: MusicBrainzClient, gateway: Arc<CacheGateway>) -> Self {
        Self { client, gateway }
    }

    async fn find_recording(
        &self,
        track: &StreamingTrack,
    ) -> Result<Option<RecordingDto>, MetadataError> {
        if let Some(isrc) = &track.isrc {
            let recordings = self
                .client
                .search_recordings(&format!("isrc:{}", isrc))
                .await?;
            if let Some(recording) = recordings.into_iter().next() {
                return Ok(Some(recording));
            }
            debug!("No recording for ISRC {}, searching by metadata", isrc);
        }

        let Some(query) = metadata_query(track) else {
            return Ok(None);
        };
        Ok(self.client.search_recordings(&query).await?.into_iter().next())
    }

    async fn resolve_uncached(
        &self,
        track: &StreamingTrack,
    ) -> Result<Option<ResolvedAttribution>, MetadataError> {
        let Some(recording) = self.find_recording(track).await? else {
            info!("No MusicBrainz recording found for track {}", track.id);
            return Ok(None);
        };

        let Some(release) =
            select_closest_release(&recording.releases, &track.album, &track.release_date)
        else {
            info!("Recording {} has no releases", recording.id);
            return Ok(None);
        };

        let details = self.client.recording_with_relations(&recording.id).await?;
        let release_details = self.client.release(&release.id).await?;

        let Some(main_artist) = first_credited(&release_details.artist_credit)
            .or_else(|| first_credited(&recording.artist_credit))
        else {
            info!("Release {} has no artist credit", release.id);
            return Ok(None);
        };

        let features = recording
            .artist_credit
            .iter()
            .map(|credit| Entity::from(credit.artist.clone()))
            .filter(|artist| artist.id != main_artist.id)
            .collect();

        let labels = release_details
            .label_info
            .into_iter()
            .filter_map(|info| info.label.map(Entity::from))
            .collect();

        let (producers, involvement) = group_relations(details.relations);

        Ok(Some(ResolvedAttribution {
            title: recording.title,
            main_artist,
            features,
            producers,
            labels,
            involvement,
            closest_release_date: release.date.clone(),
        }))
    }
}

#[async_trait]
impl MetadataResolver for MusicBrainzResolver {
    async fn resolve(
        &self,
        track: &StreamingTrack,
    ) -> Result<Option<ResolvedAttribution>, MetadataError> {
        let key = format!(
            "track-{}-{}",
            track.id,
            track.isrc.as_deref().unwrap_or("none")
        );
        self.gateway
            .cached(&key, || self.resolve_uncached(track))
            .await
    }
}
