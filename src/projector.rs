//! Rank-date projector (SPEC_FULL §4.4): assigns `rank_date_early`,
//! `rank_date` and `probability` to every qualified map in a mode's queue,
//! enforcing daily and per-run caps, then re-estimates probability across
//! modes.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use indexmap::IndexMap;

use crate::constants::{DAY, MINUTE, RANK_INTERVAL, RANK_PER_DAY, RANK_PER_RUN, SPLIT};
use crate::model::{BeatmapSet, GameMode, Scheduling};
use crate::probability::probability_after;

/// Rounds `dt` down to the most recent RANK_INTERVAL-minute UTC boundary.
pub fn floor_to_interval(dt: DateTime<Utc>) -> DateTime<Utc> {
    let minutes_since_epoch = dt.timestamp().div_euclid(MINUTE);
    let floored_minutes = minutes_since_epoch.div_euclid(RANK_INTERVAL) * RANK_INTERVAL;
    DateTime::from_utc(
        chrono::NaiveDateTime::from_timestamp(floored_minutes * MINUTE, 0),
        Utc,
    )
}

/// Rounds `dt` up to the next RANK_INTERVAL-minute UTC boundary (or leaves
/// it unchanged if it already sits on one).
pub fn ceil_to_interval(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_to_interval(dt);
    if floored == dt {
        floored
    } else {
        floored + Duration::minutes(RANK_INTERVAL)
    }
}

/// Seconds elapsed since the most recent RANK_INTERVAL boundary.
fn interval_time_delta(dt: DateTime<Utc>) -> f64 {
    ((dt.minute() as i64 % RANK_INTERVAL) * 60 + dt.second() as i64) as f64
}

fn scheduling_at<'a>(ranked: &'a [BeatmapSet], qualified: &'a [BeatmapSet], idx: usize) -> &'a Scheduling {
    if idx < ranked.len() {
        &ranked[idx].scheduling
    } else {
        &qualified[idx - ranked.len()].scheduling
    }
}

/// Projects rank dates for one mode's queue. `qualified_maps` is mutated in
/// place; `ranked_maps` is read-only context. Both must already be ordered
/// ascending (`ranked_maps` by `rank_date`, `qualified_maps` by
/// `queue_date`). `start` lets a caller resume projection partway through
/// `qualified_maps` (e.g. because the leading entries were already
/// projected in a previous call).
pub fn adjust_rank_dates(qualified_maps: &mut [BeatmapSet], ranked_maps: &[BeatmapSet], start: usize) {
    let ranked_len = ranked_maps.len();
    let combined_len = ranked_len + qualified_maps.len();

    for i in (ranked_len + start)..combined_len {
        let qi = i - ranked_len;

        // Step A: daily cap compare map.
        let mut count = 0usize;
        let mut compare_map_idx: Option<usize> = None;
        for j in (0..i).rev() {
            if scheduling_at(ranked_maps, qualified_maps, j).unresolved {
                continue;
            }
            count += 1;
            if count == RANK_PER_DAY {
                compare_map_idx = Some(j);
                break;
            }
        }

        let mut compare_date: Option<DateTime<Utc>> = compare_map_idx
            .and_then(|j| scheduling_at(ranked_maps, qualified_maps, j).rank_date)
            .map(|d| d + Duration::seconds(DAY));

        if i >= ranked_len + RANK_PER_DAY {
            compare_date = compare_date.map(|d| d + Duration::minutes(RANK_INTERVAL));
        }

        let queue_date = qualified_maps[qi]
            .scheduling
            .queue_date
            .expect("a qualified map must have a queue_date");

        // Step B: early time.
        let rank_date_early = match compare_date {
            Some(cd) if cd > queue_date => cd,
            _ => queue_date,
        };

        // Step C: probability.
        let queue_gt_compare = match compare_date {
            None => true,
            Some(cd) => queue_date > cd,
        };
        let fine_window_not_full = i < ranked_len + RANK_PER_DAY;

        let probability = if queue_gt_compare || fine_window_not_full {
            Some(probability_after(interval_time_delta(rank_date_early), None))
        } else {
            None
        };

        // Step D: round up.
        let rank_date = ceil_to_interval(rank_date_early);

        let sched = &mut qualified_maps[qi].scheduling;
        sched.rank_date_early = Some(rank_date_early);
        sched.rank_date = Some(rank_date);
        sched.probability = probability;
        drop(sched);

        // Step E: per-run (batch) cap.
        let unresolved = qualified_maps[qi].scheduling.unresolved;
        if i >= RANK_PER_RUN && !unresolved {
            let filtered_maps: Vec<&Scheduling> = (0..i)
                .rev()
                .map(|j| scheduling_at(ranked_maps, qualified_maps, j))
                .filter(|s| !s.unresolved)
                .collect();

            if !filtered_maps.is_empty() {
                let prior = filtered_maps[0];
                let current_rank_date = qualified_maps[qi].scheduling.rank_date.unwrap();
                let current_early = qualified_maps[qi].scheduling.rank_date_early.unwrap();

                let e1_fires = prior.queue_date.is_some()
                    && current_rank_date < floor_to_interval(prior.rank_date.unwrap());

                if e1_fires {
                    let floored = floor_to_interval(prior.rank_date.unwrap());
                    let sched = &mut qualified_maps[qi].scheduling;
                    sched.rank_date = Some(floored);
                    sched.rank_date_early = Some(floored);
                    sched.probability = Some(0.0);
                } else if filtered_maps.len() >= RANK_PER_RUN {
                    let slot_saturated = filtered_maps[0..RANK_PER_RUN]
                        .iter()
                        .all(|s| floor_to_interval(s.rank_date.unwrap()) >= floor_to_interval(current_early));

                    if slot_saturated {
                        let first_floor = floor_to_interval(filtered_maps[0].rank_date.unwrap());
                        let last_floor =
                            floor_to_interval(filtered_maps[RANK_PER_RUN - 1].rank_date.unwrap());
                        let all_same_slot = filtered_maps[0..RANK_PER_RUN]
                            .iter()
                            .all(|s| floor_to_interval(s.rank_date.unwrap()) == last_floor);

                        let new_rank_date = if all_same_slot && first_floor == last_floor {
                            first_floor + Duration::minutes(RANK_INTERVAL)
                        } else {
                            first_floor
                        };

                        let sched = &mut qualified_maps[qi].scheduling;
                        sched.rank_date = Some(new_rank_date);
                        sched.rank_date_early = Some(new_rank_date);
                        sched.probability = Some(0.0);
                    }
                }
            }
        }
    }
}

/// Re-estimates probability across modes after every mode has been
/// projected independently by [`adjust_rank_dates`].
pub fn calc_early_probability(qualified_by_mode: &mut HashMap<GameMode, Vec<BeatmapSet>>) {
    let mut rank_dates: IndexMap<DateTime<Utc>, [i64; 4]> = IndexMap::new();

    for mode in GameMode::ALL {
        if let Some(maps) = qualified_by_mode.get(&mode) {
            for m in maps {
                let key = match m.scheduling.probability {
                    Some(p) if p > SPLIT => floor_to_interval(
                        m.scheduling
                            .rank_date_early
                            .expect("projected map must have rank_date_early"),
                    ),
                    _ => m.scheduling.rank_date.expect("projected map must have rank_date"),
                };
                let entry = rank_dates.entry(key).or_insert([0; 4]);
                entry[mode.index()] += 1;
            }
        }
    }

    for mode in GameMode::ALL {
        if let Some(maps) = qualified_by_mode.get_mut(&mode) {
            for m in maps.iter_mut() {
                let early = m.scheduling.rank_date_early;
                let rank = m.scheduling.rank_date;
                if m.scheduling.probability.is_none() || early == rank {
                    continue;
                }

                let key = floor_to_interval(early.unwrap());
                if let Some(counts) = rank_dates.get(&key) {
                    let others: Vec<i64> = GameMode::ALL
                        .iter()
                        .filter(|&&m| m != mode)
                        .map(|m| counts[m.index()])
                        .collect();
                    let delta = interval_time_delta(early.unwrap());
                    m.scheduling.probability = Some(probability_after(delta, Some(&others)));
                }
            }
        }
    }
}

/// Top-level entry: projects every mode's queue, then re-estimates
/// probability across modes.
pub fn adjust_all_rank_dates(
    qualified_by_mode: &mut HashMap<GameMode, Vec<BeatmapSet>>,
    ranked_by_mode: &HashMap<GameMode, Vec<BeatmapSet>>,
) {
    for mode in GameMode::ALL {
        let ranked_for_mode = ranked_by_mode.get(&mode).cloned().unwrap_or_default();
        if let Some(qualified_for_mode) = qualified_by_mode.get_mut(&mode) {
            adjust_rank_dates(qualified_for_mode, &ranked_for_mode, 0);
        }
    }
    calc_early_probability(qualified_by_mode);
}
