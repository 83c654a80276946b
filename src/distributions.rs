//! Closed-form CDF of a sum of uniform random variables (SPEC_FULL §4.1).

/// The CDF of the sum of `n` independent uniform `[0, 1]` variables at `x`.
///
/// `n` is small (<= 4 in the projector's use) so a naive factorial/binomial
/// is fine. Monotone non-decreasing in `x`; `uniform_sum_cdf(n, n as f64 / 2.0) == 0.5`.
pub fn uniform_sum_cdf(n: u32, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= n as f64 {
        return 1.0;
    }

    let n_fact = factorial(n);
    let sum: f64 = (0..=n)
        .map(|k| {
            let term = x - k as f64;
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            sign * binomial(n, k) as f64 * sgn(term) * term.powi(n as i32)
        })
        .sum();

    0.5 + sum / (2.0 * n_fact as f64)
}

fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn factorial(n: u32) -> u64 {
    (1..=n as u64).product::<u64>().max(1)
}

fn binomial(n: u32, k: u32) -> u64 {
    factorial(n) / (factorial(k) * factorial(n - k))
}
