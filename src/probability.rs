//! Per-mode probability that a map ranks before a given offset past its
//! rank-interval boundary (SPEC_FULL §4.2).

use std::collections::HashMap;

use crate::constants::{DELAY_MAX, DELAY_MIN};
use crate::distributions::uniform_sum_cdf;

/// Returns the probability that this mode's next map ranks before
/// `seconds_since_interval_boundary` past the last interval boundary,
/// averaged over the four possible positions (1..=4) this mode can occupy
/// in the cross-mode rank order.
///
/// `other_mode_counts` gives how many maps each other mode contributes to
/// the same interval; `None` is treated as "no other mode contributes
/// anything", i.e. every position sees a sum set of `{0}`.
pub fn probability_after(seconds_since_interval_boundary: f64, other_mode_counts: Option<&[i64]>) -> f64 {
    let mut cache: HashMap<u32, f64> = HashMap::new();

    let mut total = 0.0;
    for pos in 1..=4u32 {
        let perm_sums = match other_mode_counts {
            None => vec![0i64],
            Some(counts) => {
                let mut sums = sums_of_k_distinct(counts, (pos - 1) as usize);
                sums.sort_unstable();
                sums.dedup();
                sums
            }
        };

        let mode_sum: f64 = perm_sums
            .iter()
            .map(|&s| {
                let m = pos + s as u32;
                *cache.entry(m).or_insert_with(|| {
                    let scaled = (seconds_since_interval_boundary - m as f64 * DELAY_MIN) / (DELAY_MAX - DELAY_MIN);
                    1.0 - uniform_sum_cdf(m, scaled)
                })
            })
            .sum::<f64>()
            / perm_sums.len() as f64;

        total += mode_sum;
    }

    let avg = total / 4.0;
    (avg * 100_000.0).floor() / 100_000.0
}

/// All distinct sums of `k` values chosen without replacement (and without
/// regard to order) from `counts`.
fn sums_of_k_distinct(counts: &[i64], k: usize) -> Vec<i64> {
    if k == 0 {
        return vec![0];
    }
    if k > counts.len() {
        return vec![];
    }

    let mut out = Vec::new();
    combine(counts, k, 0, 0, &mut out);
    out
}

fn combine(counts: &[i64], k: usize, start: usize, acc: i64, out: &mut Vec<i64>) {
    if k == 0 {
        out.push(acc);
        return;
    }
    for i in start..counts.len() {
        combine(counts, k - 1, i + 1, acc + counts[i], out);
    }
}
