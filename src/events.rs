//! Event-log reducer: derives a beatmap set's effective queue entry date by
//! replaying its moderation event history (SPEC_FULL §4.3).

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::constants::{DAY, MAXIMUM_PENALTY_DAYS, MINIMUM_DAYS_FOR_RANK};

/// The moderation actions that can appear in a beatmap set's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEventType {
    Qualify,
    Disqualify,
    Rank,
    Nominate,
    NominationReset,
}

/// A single moderation event on a beatmap set.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
    pub id: i64,
    pub beatmap_set_id: i64,
    pub event_type: MapEventType,
    pub created_at: DateTime<Utc>,

    /// Populated for `qualify`/`disqualify` events: the beatmap ids in the
    /// set at the time of the event.
    pub beatmap_ids: Vec<i64>,

    /// Populated for `disqualify` events: the accumulated nominator ids at
    /// the time of disqualification.
    pub nominators: Vec<i64>,

    /// Populated for `nominate` events.
    pub user_id: Option<i64>,
}

/// Failure replaying a beatmap set's event log (SPEC_FULL §7).
#[derive(Error, Debug)]
pub enum EventLogInconsistent {
    /// The event log never produced a `queued_at`, yet the caller reports
    /// this set as currently qualified.
    #[error("beatmap set {0} is qualified but its event log never recorded a qualify")]
    NoQualifyFound(i64),
}

/// Replays `events` (must be in chronological order) and the beatmap set's
/// *current* beatmap ids, and returns the effective `queue_date`.
///
/// Returns `Err(EventLogInconsistent)` if the replay ends without ever
/// having set `queued_at` (SPEC_FULL §4.3).
pub fn reduce_queue_date(
    beatmap_set_id: i64,
    events: &[MapEvent],
    current_beatmap_ids: &[i64],
) -> Result<DateTime<Utc>, EventLogInconsistent> {
    let mut queued_at: Option<DateTime<Utc>> = None;
    let mut previous_queue_duration = Duration::zero();
    let mut last_disqualified_event: Option<&MapEvent> = None;
    let mut nominators: Vec<i64> = Vec::new();

    for event in events {
        match event.event_type {
            MapEventType::Qualify => {
                queued_at = Some(event.created_at);

                if let Some(dq) = last_disqualified_event {
                    if nominators != dq.nominators {
                        previous_queue_duration = Duration::zero();
                    }

                    let beatmaps_changed = current_beatmap_ids
                        .iter()
                        .any(|id| !dq.beatmap_ids.contains(id));

                    if beatmaps_changed {
                        // No credit, no penalty: leave queued_at = event.created_at.
                    } else {
                        let credit = previous_queue_duration
                            .min(Duration::days(MINIMUM_DAYS_FOR_RANK - 1));
                        let mut new_queued_at = event.created_at - credit;

                        let elapsed = event.created_at - dq.created_at;
                        let penalty_days =
                            (elapsed.num_seconds() / (7 * DAY)).min(MAXIMUM_PENALTY_DAYS);
                        new_queued_at = new_queued_at + Duration::days(penalty_days);

                        queued_at = Some(new_queued_at);
                    }
                }
            }
            MapEventType::Disqualify => {
                if let Some(qa) = queued_at {
                    previous_queue_duration = event.created_at - qa;
                }
                last_disqualified_event = Some(event);
                nominators.clear();
            }
            MapEventType::Rank => {
                previous_queue_duration = Duration::zero();
                queued_at = None;
            }
            MapEventType::Nominate => {
                if let Some(user_id) = event.user_id {
                    nominators.push(user_id);
                }
            }
            MapEventType::NominationReset => {
                nominators.clear();
            }
        }
    }

    match queued_at {
        Some(qa) => Ok(qa + Duration::days(MINIMUM_DAYS_FOR_RANK)),
        None => Err(EventLogInconsistent::NoQualifyFound(beatmap_set_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(epoch_secs: i64) -> DateTime<Utc> {
        Utc.timestamp(epoch_secs, 0)
    }

    fn qualify(time: DateTime<Utc>) -> MapEvent {
        MapEvent {
            id: 1,
            beatmap_set_id: 1,
            event_type: MapEventType::Qualify,
            created_at: time,
            beatmap_ids: vec![1],
            nominators: vec![],
            user_id: None,
        }
    }

    fn disqualify(time: DateTime<Utc>, beatmap_ids: Vec<i64>, nominators: Vec<i64>) -> MapEvent {
        MapEvent {
            id: 2,
            beatmap_set_id: 1,
            event_type: MapEventType::Disqualify,
            created_at: time,
            beatmap_ids,
            nominators,
            user_id: None,
        }
    }

    fn nominate(time: DateTime<Utc>, user_id: i64) -> MapEvent {
        MapEvent {
            id: 3,
            beatmap_set_id: 1,
            event_type: MapEventType::Nominate,
            created_at: time,
            beatmap_ids: vec![],
            nominators: vec![],
            user_id: Some(user_id),
        }
    }

    /// S1: single map, no prior disqualify.
    #[test]
    fn s1_single_qualify_no_prior_disqualify() {
        let t0 = at(0);
        let events = vec![qualify(t0)];
        let queue_date = reduce_queue_date(1, &events, &[1]).unwrap();
        assert_eq!(queue_date, t0 + Duration::days(MINIMUM_DAYS_FOR_RANK));
    }

    /// S2: requalify with same nominators and same beatmap ids, 10 days
    /// between dq and requalify; prior queue lasted 3 days before dq.
    #[test]
    fn s2_requalify_same_nominators_same_beatmaps() {
        let nominate_time = at(0);
        let first_qualify = at(DAY); // queued at day 1
        let dq_time = first_qualify + Duration::days(3); // queued 3 days before dq
        let requalify_time = dq_time + Duration::days(10);

        let events = vec![
            nominate(nominate_time, 42),
            qualify(first_qualify),
            disqualify(dq_time, vec![1], vec![42]),
            nominate(nominate_time, 42), // same nominator re-accumulated since reset
            qualify(requalify_time),
        ];

        let queue_date = reduce_queue_date(1, &events, &[1]).unwrap();
        // penalty_days = floor(10/7) = 1, credit = min(3 days, 6 days) = 3 days
        let expected_queued_at = requalify_time - Duration::days(3) + Duration::days(1);
        let expected = expected_queued_at + Duration::days(MINIMUM_DAYS_FOR_RANK);
        assert_eq!(queue_date, expected);
        assert_eq!(queue_date, requalify_time + Duration::days(5));
    }

    /// S3: requalify with different nominators — credit discarded, penalty still applied.
    #[test]
    fn s3_requalify_different_nominators() {
        let first_qualify = at(DAY);
        let dq_time = first_qualify + Duration::days(3);
        let requalify_time = dq_time + Duration::days(10);

        let events = vec![
            nominate(at(0), 1),
            qualify(first_qualify),
            disqualify(dq_time, vec![1], vec![1]),
            nominate(at(0), 2), // different nominator this time
            qualify(requalify_time),
        ];

        let queue_date = reduce_queue_date(1, &events, &[1]).unwrap();
        assert_eq!(
            queue_date,
            requalify_time + Duration::days(MINIMUM_DAYS_FOR_RANK) + Duration::days(1)
        );
    }

    /// S4: requalify after adding a new beatmap — credit discarded regardless
    /// of nominators, and the penalty branch does not run either.
    #[test]
    fn s4_requalify_after_adding_beatmap() {
        let first_qualify = at(DAY);
        let dq_time = first_qualify + Duration::days(3);
        let requalify_time = dq_time + Duration::days(10);

        let events = vec![
            nominate(at(0), 1),
            qualify(first_qualify),
            disqualify(dq_time, vec![1], vec![1]),
            nominate(at(0), 1), // same nominator
            qualify(requalify_time),
        ];

        // Current beatmap ids include a new id (2) not present at disqualify time.
        let queue_date = reduce_queue_date(1, &events, &[1, 2]).unwrap();
        assert_eq!(queue_date, requalify_time + Duration::days(MINIMUM_DAYS_FOR_RANK));
    }

    #[test]
    fn rank_event_clears_state() {
        let t0 = at(0);
        let events = vec![
            qualify(t0),
            MapEvent {
                id: 9,
                beatmap_set_id: 1,
                event_type: MapEventType::Rank,
                created_at: t0 + Duration::days(7),
                beatmap_ids: vec![],
                nominators: vec![],
                user_id: None,
            },
        ];
        let err = reduce_queue_date(1, &events, &[1]).unwrap_err();
        assert!(matches!(err, EventLogInconsistent::NoQualifyFound(1)));
    }

    #[test]
    fn no_qualify_is_inconsistent() {
        let err = reduce_queue_date(7, &[], &[1]).unwrap_err();
        assert!(matches!(err, EventLogInconsistent::NoQualifyFound(7)));
    }
}
