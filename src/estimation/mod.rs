//! Estimators for the rank at which the learner's chance of knowing a word
//! drops to a target probability, given sparse (rank, known) evidence.

use std::cmp::Ordering;

use crate::core::{
    config::EstimatorKind,
    utils::round_half_up,
};

pub mod crossing;
pub mod irt;
pub mod logistic;
pub mod picker;
pub mod sliding_window;

pub use crossing::{
    estimate_rank,
    CrossingEstimator,
};
pub use irt::{
    IrtConfig,
    IrtEstimator,
};
pub use logistic::LogisticEstimator;
pub use picker::{
    pick_index,
    PickerEstimator,
};
pub use sliding_window::SlidingWindowEstimator;

/// `(rank, known)`
pub type Observation = (i64, bool);

pub trait KnowledgeEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rank strictly between `low` and `high` where the probability of knowing
    /// a word is about `probability`, or `None` when the data can't say.
    fn estimate(&self, low: i64, high: i64, data: &[Observation], probability: f64)
        -> Option<i64>;
}

pub fn estimator_for(kind: EstimatorKind) -> Box<dyn KnowledgeEstimator> {
    match kind {
        EstimatorKind::Picker => Box::new(PickerEstimator),
        EstimatorKind::Crossing => Box::new(CrossingEstimator),
        EstimatorKind::Logistic => Box::new(LogisticEstimator::default()),
        EstimatorKind::Irt => Box::new(IrtEstimator::default()),
        EstimatorKind::SlidingWindow => Box::new(SlidingWindowEstimator::default()),
    }
}

/// Both curves evaluated just after one observation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CurvePoint {
    pub rank: i64,
    /// Weighted fraction known among observations at or below `rank`.
    pub frac_known_below: f64,
    /// Weighted fraction unknown among observations above `rank`; `None` past the last one.
    pub frac_unknown_above: Option<f64>,
}

impl CurvePoint {
    pub fn cmp(&self) -> Option<Ordering> {
        self.frac_unknown_above.and_then(|above| self.frac_known_below.partial_cmp(&above))
    }
}

pub(crate) fn sorted_observations(data: &[Observation]) -> Vec<Observation> {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    sorted
}

/// Unknown observations weigh `p / (1 - p)`, which moves the crossing of the
/// two curves to where the known fraction is `p` instead of one half.
pub(crate) fn fraction_curves(sorted: &[Observation], probability: f64) -> Vec<CurvePoint> {
    assert!(probability > 0.0 && probability < 1.0, "probability must be in (0, 1)");
    let unknown_weight = probability / (1.0 - probability);

    let count_total = sorted.len();
    let count_known = sorted.iter().filter(|(_, known)| *known).count();
    let mut known_below = 0usize;

    sorted
        .iter()
        .enumerate()
        .map(|(i, &(rank, known))| {
            if known {
                known_below += 1;
            }

            let count_below = i + 1;
            let unknown_below = count_below - known_below;
            let wgt_count_below = known_below as f64 + unknown_weight * unknown_below as f64;
            let frac_known_below = known_below as f64 / wgt_count_below;

            let known_above = count_known - known_below;
            let count_above = count_total - count_below;
            let unknown_above = count_above - known_above;
            let wgt_unknown_above = unknown_weight * unknown_above as f64;
            let frac_unknown_above = (count_above > 0)
                .then(|| wgt_unknown_above / (known_above as f64 + wgt_unknown_above));

            CurvePoint { rank, frac_known_below, frac_unknown_above }
        })
        .collect()
}

pub(crate) fn rounded_midpoint(a: i64, b: i64) -> i64 {
    round_half_up(0.5 * (a + b) as f64) as i64
}
