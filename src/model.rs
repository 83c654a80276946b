//! Domain data model (SPEC_FULL §3).

use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// One of the four gameplay variants a beatmap can be played in.
///
/// A beatmap set's mode is the minimum over its beatmaps' modes; a set
/// lives in exactly one mode's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSql, FromSql, Serialize_repr, Deserialize_repr)]
#[postgres(name = "game_mode")]
#[repr(u8)]
pub enum GameMode {
    Osu = 0,
    Taiko = 1,
    Catch = 2,
    Mania = 3,
}

impl GameMode {
    /// All four modes, in ascending order.
    pub const ALL: [GameMode; 4] = [GameMode::Osu, GameMode::Taiko, GameMode::Catch, GameMode::Mania];

    /// Index into a 4-element array keyed by mode.
    pub fn index(self) -> usize {
        self as u8 as usize
    }

    pub fn from_index(idx: usize) -> Option<GameMode> {
        Self::ALL.get(idx).copied()
    }
}

/// A single difficulty within a beatmap set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: i64,

    /// The difficulty name, e.g. "Insane".
    pub version: String,

    pub spinner_count: i32,

    pub star_rating: f64,

    pub length_seconds: i32,

    pub mode: GameMode,
}

/// The scheduling attributes the rank-date projector assigns and mutates.
///
/// Always present as a record with explicit optional timestamps, per
/// SPEC_FULL §9: "never encode absent by sentinel zeros".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scheduling {
    /// When the 7-day holding clock effectively started. `None` for sets
    /// that are not currently qualified.
    pub queue_date: Option<DateTime<Utc>>,

    /// The projected rank wall-clock time, rounded up to a RANK_INTERVAL
    /// boundary. Present whenever the set is qualified or recently ranked.
    pub rank_date: Option<DateTime<Utc>>,

    /// The projected earliest rank moment before rounding; `<= rank_date`.
    pub rank_date_early: Option<DateTime<Utc>>,

    /// Probability the set ranks at `rank_date_early` rather than being
    /// deferred to `rank_date`. `None` iff the early and rounded times are
    /// equal, or the coarse compare path was taken (SPEC_FULL §4.4).
    pub probability: Option<f64>,

    /// Disables this set from counting toward the daily/per-run caps.
    pub unresolved: bool,
}

/// A beatmap set: a mapper's submission, grouped by mode into a queue.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatmapSet {
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub mapper: String,
    pub mapper_id: i64,

    /// The minimum mode across `beatmaps`.
    pub mode: GameMode,

    /// Sorted ascending by star rating.
    pub beatmaps: Vec<Beatmap>,

    pub scheduling: Scheduling,
}

impl BeatmapSet {
    /// Build a set from its beatmaps, deriving `mode` as the minimum mode
    /// across them and sorting them by star rating ascending.
    pub fn new(
        id: i64,
        artist: String,
        title: String,
        mapper: String,
        mapper_id: i64,
        mut beatmaps: Vec<Beatmap>,
        scheduling: Scheduling,
    ) -> Self {
        beatmaps.sort_by(|a, b| a.star_rating.partial_cmp(&b.star_rating).unwrap());
        let mode = beatmaps
            .iter()
            .map(|b| b.mode)
            .min()
            .expect("a beatmap set must contain at least one beatmap");
        BeatmapSet {
            id,
            artist,
            title,
            mapper,
            mapper_id,
            mode,
            beatmaps,
            scheduling,
        }
    }
}
