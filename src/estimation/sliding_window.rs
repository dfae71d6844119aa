use super::{
    sorted_observations,
    KnowledgeEstimator,
    Observation,
};

const SIGNIFICANCE: f64 = 0.2;
const MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResult {
    pub window_begin: i64,
    /// Exclusive.
    pub window_end: i64,
    pub confident: bool,
}

fn ln_choose(n: usize, k: usize) -> f64 {
    (1..=k).map(|i| ((n - k + i) as f64 / i as f64).ln()).sum()
}

fn binomial_pmf(n: usize, k: usize, p: f64) -> f64 {
    let p = p.clamp(1e-12, 1.0 - 1e-12);
    (ln_choose(n, k) + k as f64 * p.ln() + (n - k) as f64 * (1.0 - p).ln()).exp()
}

/// P(X >= k) for X ~ Binomial(n, p).
fn at_least(n: usize, k: usize, p: f64) -> f64 {
    (k..=n).map(|i| binomial_pmf(n, i, p)).sum()
}

/// P(X <= k) for X ~ Binomial(n, p).
fn at_most(n: usize, k: usize, p: f64) -> f64 {
    (0..=k).map(|i| binomial_pmf(n, i, p)).sum()
}

/// Moves a window of `window_size` ranks, starting around `init_rank`, by
/// whole widths towards where the known fraction matches `target`. Stops
/// confidently once the window's known count is significantly within
/// `target ± 0.1` on both sides, and gives up when the window holds no data,
/// hits the target exactly without significance, or runs out of moves.
/// The window may begin below zero.
pub fn find_rank(
    data: &[Observation],
    target: f64,
    window_size: i64,
    init_rank: i64,
    max_moves: usize,
) -> WindowResult {
    let data = sorted_observations(data);
    let half = window_size / 2;
    let mut begin = init_rank - half;
    let mut end = init_rank + half;

    for _ in 0..max_moves {
        let (known, total) = data
            .iter()
            .filter(|(rank, _)| *rank >= begin && *rank < end)
            .fold((0usize, 0usize), |(k, t), (_, is_known)| (k + *is_known as usize, t + 1));

        if total == 0 {
            return WindowResult { window_begin: begin, window_end: end, confident: false };
        }

        let above_low = at_least(total, known, target - MARGIN) <= SIGNIFICANCE;
        let below_high = at_most(total, known, target + MARGIN) <= SIGNIFICANCE;
        if above_low && below_high {
            return WindowResult { window_begin: begin, window_end: end, confident: true };
        }

        let frac = known as f64 / total as f64;
        let size = end - begin;
        if frac > target {
            begin += size;
            end += size;
        } else if frac < target {
            if begin > 0 {
                begin -= size;
                end -= size;
            } else {
                end = end.div_euclid(2);
            }
        } else {
            return WindowResult { window_begin: begin, window_end: end, confident: false };
        }
    }

    WindowResult { window_begin: begin, window_end: end, confident: false }
}

pub struct SlidingWindowEstimator {
    pub window_size: i64,
    pub max_moves: usize,
}

impl Default for SlidingWindowEstimator {
    fn default() -> Self {
        Self { window_size: 500, max_moves: 64 }
    }
}

impl KnowledgeEstimator for SlidingWindowEstimator {
    fn name(&self) -> &'static str {
        "sliding_window"
    }

    fn estimate(
        &self,
        low: i64,
        high: i64,
        data: &[Observation],
        probability: f64,
    ) -> Option<i64> {
        let init_rank = low + (high - low) / 2;
        let window = find_rank(data, probability, self.window_size, init_rank, self.max_moves);
        if !window.confident {
            return None;
        }
        let middle = window.window_begin + (window.window_end - window.window_begin) / 2;
        (middle > low && middle < high).then_some(middle)
    }
}
