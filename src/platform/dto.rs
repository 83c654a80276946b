//! JSON DTOs matching the platform API's response shapes one-to-one
//! (SPEC_FULL §3, §6), one struct per endpoint, following the teacher's
//! `network::exchange::ExchangeMetadata` convention.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::constants::TOKEN_EXPIRY_SKEW_SECS;
use crate::events::{MapEvent, MapEventType};
use crate::model::{Beatmap, BeatmapSet, GameMode, Scheduling};

/// A cached OAuth client-credentials token.
///
/// Reference: `POST oauth/token`.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthToken {
    pub value: String,
    pub expires_at_epoch_ms: i64,
}

impl OAuthToken {
    /// Treated as expired `TOKEN_EXPIRY_SKEW_SECS` before its stated expiry,
    /// to allow for clock skew between us and the platform (SPEC_FULL §5).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at_epoch_ms - TOKEN_EXPIRY_SKEW_SECS * 1000
    }
}

/// `POST oauth/token` response.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,

    /// Seconds until expiry, relative to when the response was received.
    pub expires_in: i64,
}

/// One beatmap within `BeatmapsetResponse`.
#[derive(Deserialize, Debug)]
pub struct BeatmapDto {
    pub id: i64,
    pub version: String,
    pub count_spinners: i32,
    pub difficulty_rating: f64,
    pub total_length: i32,
    pub mode_int: u8,
}

/// `beatmapsets/{id}` response.
#[derive(Deserialize, Debug)]
pub struct BeatmapsetResponse {
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub user_id: i64,
    pub ranked_date: Option<DateTime<Utc>>,
    pub status: String,
    pub beatmaps: Vec<BeatmapDto>,
}

impl From<BeatmapsetResponse> for BeatmapSet {
    fn from(dto: BeatmapsetResponse) -> Self {
        let beatmaps = dto
            .beatmaps
            .into_iter()
            .map(|b| Beatmap {
                id: b.id,
                version: b.version,
                spinner_count: b.count_spinners,
                star_rating: b.difficulty_rating,
                length_seconds: b.total_length,
                mode: GameMode::from_index(b.mode_int as usize).unwrap_or(GameMode::Osu),
            })
            .collect();

        BeatmapSet::new(
            dto.id,
            dto.artist,
            dto.title,
            dto.creator,
            dto.user_id,
            beatmaps,
            Scheduling::default(),
        )
    }
}

/// The `comment` payload on `qualify`/`disqualify`/`nominate` events.
#[derive(Deserialize, Debug, Default)]
pub struct MapEventComment {
    #[serde(default)]
    pub beatmap_ids: Vec<i64>,

    #[serde(default)]
    pub nominator_ids: Vec<i64>,
}

/// A reference to the beatmap set an event concerns, however the endpoint
/// happens to embed it (`beatmapset` or `discussion`).
#[derive(Deserialize, Debug)]
pub struct MapEventBeatmapsetRef {
    pub id: i64,
}

#[derive(Deserialize, Debug)]
pub struct MapEventDiscussionRef {
    pub beatmapset_id: i64,
}

/// One event from `beatmapsets/events`.
#[derive(Deserialize, Debug)]
pub struct MapEventDto {
    pub id: i64,

    #[serde(rename = "type")]
    pub event_type: String,

    pub created_at: DateTime<Utc>,
    pub beatmapset: Option<MapEventBeatmapsetRef>,
    pub discussion: Option<MapEventDiscussionRef>,
    pub user_id: Option<i64>,
    pub comment: Option<MapEventComment>,
}

impl MapEventDto {
    fn beatmapset_id(&self) -> Option<i64> {
        self.beatmapset
            .as_ref()
            .map(|b| b.id)
            .or_else(|| self.discussion.as_ref().map(|d| d.beatmapset_id))
    }

    /// Converts to the internal [`MapEvent`] form, or `None` if the event
    /// type is not one we track.
    pub fn into_map_event(self) -> Option<MapEvent> {
        let event_type = match self.event_type.as_str() {
            "qualify" => MapEventType::Qualify,
            "disqualify" => MapEventType::Disqualify,
            "rank" => MapEventType::Rank,
            "nominate" => MapEventType::Nominate,
            "nomination_reset" => MapEventType::NominationReset,
            _ => return None,
        };

        let beatmap_set_id = self.beatmapset_id()?;
        let comment = self.comment.unwrap_or_default();

        Some(MapEvent {
            id: self.id,
            beatmap_set_id,
            event_type,
            created_at: self.created_at,
            beatmap_ids: comment.beatmap_ids,
            nominators: comment.nominator_ids,
            user_id: self.user_id,
        })
    }
}

/// `beatmapsets/events` response, for both the per-set and the global paged
/// endpoint.
#[derive(Deserialize, Debug)]
pub struct EventsResponse {
    pub events: Vec<MapEventDto>,
}

/// One entry of `beatmapsets/discussions`.
#[derive(Deserialize, Debug)]
pub struct DiscussionBeatmapset {
    pub id: i64,
}

/// `beatmapsets/discussions` response.
#[derive(Deserialize, Debug)]
pub struct DiscussionsResponse {
    pub beatmapsets: Vec<DiscussionBeatmapset>,
}
