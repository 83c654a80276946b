//! `beatmapsets` row shape (SPEC_FULL §6), and its conversions to/from the
//! in-memory `BeatmapSet`, kept beside the store module rather than on the
//! domain type itself, following the teacher's `database::structs`
//! convention.

use std::convert::TryFrom;

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{Beatmap, BeatmapSet, GameMode, Scheduling};

/// The literal persisted row: all timestamps as integer epoch seconds,
/// beatmaps flattened to a JSON string column.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatmapSetRow {
    pub id: i64,
    pub queue_date: Option<i64>,
    pub rank_date: i64,
    pub rank_date_early: Option<i64>,
    pub artist: String,
    pub title: String,
    pub mapper: String,
    pub mapper_id: i64,
    pub mode: GameMode,
    pub probability: Option<f64>,
    pub unresolved: bool,
    pub beatmaps: String,
}

fn to_epoch_secs(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn from_epoch_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp(secs, 0)
}

impl From<&BeatmapSet> for BeatmapSetRow {
    fn from(set: &BeatmapSet) -> Self {
        let beatmaps = serde_json::to_string(&set.beatmaps).expect("Beatmap is always serializable");

        BeatmapSetRow {
            id: set.id,
            queue_date: set.scheduling.queue_date.map(to_epoch_secs),
            rank_date: set
                .scheduling
                .rank_date
                .map(to_epoch_secs)
                .unwrap_or_default(),
            rank_date_early: set.scheduling.rank_date_early.map(to_epoch_secs),
            artist: set.artist.clone(),
            title: set.title.clone(),
            mapper: set.mapper.clone(),
            mapper_id: set.mapper_id,
            mode: set.mode,
            probability: set.scheduling.probability,
            unresolved: set.scheduling.unresolved,
            beatmaps,
        }
    }
}

impl TryFrom<BeatmapSetRow> for BeatmapSet {
    type Error = serde_json::Error;

    fn try_from(row: BeatmapSetRow) -> Result<Self, Self::Error> {
        let beatmaps: Vec<Beatmap> = serde_json::from_str(&row.beatmaps)?;

        let scheduling = Scheduling {
            queue_date: row.queue_date.map(from_epoch_secs),
            rank_date: Some(from_epoch_secs(row.rank_date)),
            rank_date_early: row.rank_date_early.map(from_epoch_secs),
            probability: row.probability,
            unresolved: row.unresolved,
        };

        Ok(BeatmapSet::new(
            row.id,
            row.artist,
            row.title,
            row.mapper,
            row.mapper_id,
            beatmaps,
            scheduling,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameMode;

    fn sample_set() -> BeatmapSet {
        BeatmapSet::new(
            1,
            "Artist".to_string(),
            "Title".to_string(),
            "Mapper".to_string(),
            7,
            vec![Beatmap {
                id: 1,
                version: "Insane".to_string(),
                spinner_count: 0,
                star_rating: 5.0,
                length_seconds: 120,
                mode: GameMode::Osu,
            }],
            Scheduling {
                queue_date: Some(Utc.timestamp(1_000, 0)),
                rank_date: Some(Utc.timestamp(2_000, 0)),
                rank_date_early: Some(Utc.timestamp(1_500, 0)),
                probability: Some(0.42),
                unresolved: false,
            },
        )
    }

    #[test]
    fn round_trips_through_row() {
        let original = sample_set();
        let row = BeatmapSetRow::from(&original);
        let restored = BeatmapSet::try_from(row).unwrap();
        assert_eq!(original, restored);
    }
}
