use super::{
    KnowledgeEstimator,
    Observation,
};
use crate::core::utils::round_half_up;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    pub bias: f64,
    pub weight: f64,
}

impl FitResult {
    /// `x` at which the fitted curve equals `probability`.
    pub fn x_for_probability(&self, probability: f64) -> f64 {
        let logit = (probability / (1.0 - probability)).ln();
        (logit - self.bias) / self.weight
    }
}

fn logistic(x: f64, bias: f64, weight: f64) -> f64 {
    1.0 / (1.0 + (-(bias + weight * x)).exp())
}

/// Single-variable logistic regression by gradient descent. `y` must be 0 or
/// 1. `reg` is the L2 penalty on the weight only.
pub fn fit(data: &[(f64, f64)], reg: f64, learn_rate: f64, iters: usize) -> FitResult {
    assert!(!data.is_empty(), "cannot fit empty data");
    assert!(data.iter().all(|&(_, y)| y == 0.0 || y == 1.0), "labels must be 0 or 1");

    let inv_len = 1.0 / data.len() as f64;
    let mut bias = 0.0;
    let mut weight = 0.0;

    for _ in 0..iters {
        let mut d_bias = 0.0;
        let mut d_weight = 0.0;
        for &(x, y) in data {
            let err = logistic(x, bias, weight) - y;
            d_bias += err;
            d_weight += err * x;
        }
        d_bias *= inv_len;
        d_weight = d_weight * inv_len + 2.0 * reg * weight;

        bias -= learn_rate * d_bias;
        weight -= learn_rate * d_weight;
    }

    FitResult { bias, weight }
}

/// Fits on `x` rescaled to `[-1, 1]` and converts the result back.
pub fn rescale_and_fit(data: &[(f64, f64)], reg: f64, learn_rate: f64, iters: usize) -> FitResult {
    assert!(data.len() >= 2, "need at least two points");

    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
    assert!(min != max, "all x values are equal");

    let inv_width = 1.0 / (max - min);
    let a = 2.0 * inv_width;
    let b = -2.0 * min * inv_width - 1.0;
    let rescaled: Vec<(f64, f64)> = data.iter().map(|&(x, y)| (a * x + b, y)).collect();

    let rfit = fit(&rescaled, reg, learn_rate, iters);
    FitResult { bias: rfit.bias + b * rfit.weight, weight: a * rfit.weight }
}

pub struct LogisticEstimator {
    pub reg: f64,
    pub learn_rate: f64,
    pub iters: usize,
}

impl Default for LogisticEstimator {
    fn default() -> Self {
        Self { reg: 0.1, learn_rate: 1.0, iters: 10_000 }
    }
}

impl KnowledgeEstimator for LogisticEstimator {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn estimate(
        &self,
        low: i64,
        high: i64,
        data: &[Observation],
        probability: f64,
    ) -> Option<i64> {
        let points: Vec<(f64, f64)> =
            data.iter().map(|&(rank, known)| (rank as f64, if known { 1.0 } else { 0.0 })).collect();
        if high - low < 2 || points.len() < 2 || points.iter().all(|p| p.0 == points[0].0) {
            return None;
        }

        let fitted = rescale_and_fit(&points, self.reg, self.learn_rate, self.iters);
        let x = fitted.x_for_probability(probability);
        if !x.is_finite() {
            return None;
        }
        Some((round_half_up(x) as i64).clamp(low + 1, high - 1))
    }
}
