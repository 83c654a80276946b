//! Tunable constants for the rank-date projection engine.
//!
//! These are compile-time defaults; [`crate::config::Config`] may override
//! the ones that are also exposed as config fields (SPEC_FULL §6).

/// Seconds in a day.
pub const DAY: i64 = 86_400;

/// Seconds in an hour.
pub const HOUR: i64 = 3_600;

/// Seconds in a minute.
pub const MINUTE: i64 = 60;

/// Minutes between rank batches on the external scheduler's wall-clock grid.
pub const RANK_INTERVAL: i64 = 20;

/// Maps released per interval tick, per mode.
pub const RANK_PER_RUN: usize = 3;

/// Maximum ranks per 24h window, per mode.
pub const RANK_PER_DAY: usize = 8;

/// Minimum number of days a set must stay qualified before it can rank.
pub const MINIMUM_DAYS_FOR_RANK: i64 = 7;

/// Maximum additional penalty days added on requalification.
pub const MAXIMUM_PENALTY_DAYS: i64 = 4;

/// Minimum randomized per-map delay past an interval boundary, in seconds.
pub const DELAY_MIN: f64 = 0.0;

/// Maximum randomized per-map delay past an interval boundary, in seconds.
pub const DELAY_MAX: f64 = 1200.0;

/// Probability threshold used to decide which bucket a set's probable
/// rank time falls into when re-estimating cross-mode probability.
pub const SPLIT: f64 = 0.5;

/// Safety cap on the number of pages the global event walker will fetch
/// before giving up (Open Question 3 in SPEC_FULL §9).
pub const MAX_WALK_PAGES: usize = 1000;

/// Number of successful page fetches after which the global event walker
/// pauses, per SPEC_FULL §5.
pub const WALK_PAGES_PER_PAUSE: usize = 30;

/// Duration of the pause after `WALK_PAGES_PER_PAUSE` successful fetches.
pub const WALK_PAUSE_SECS: u64 = 60;

/// How long before its stated expiry an OAuth token is treated as expired,
/// to allow for clock skew (SPEC_FULL §5).
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = HOUR;
