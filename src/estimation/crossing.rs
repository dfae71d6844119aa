use std::cmp::Ordering;

use super::{
    fraction_curves,
    sorted_observations,
    KnowledgeEstimator,
    Observation,
};

/// Rank at which the known-below and unknown-above curves cross, using only
/// tested ranks. Sparse data often has no crossing, hence the `Option`.
pub fn estimate_rank(data: &[Observation], probability: f64) -> Option<i64> {
    if data.is_empty() {
        return None;
    }

    let sorted = sorted_observations(data);
    let mut crossings = Vec::new();
    let mut prev_cmp = None;

    for point in fraction_curves(&sorted, probability) {
        let cur_cmp = point.cmp();
        if matches!(
            (prev_cmp, cur_cmp),
            (Some(Ordering::Greater), Some(Ordering::Less))
                | (Some(Ordering::Greater), Some(Ordering::Equal))
                | (Some(Ordering::Equal), Some(Ordering::Less))
        ) {
            crossings.push(point.rank);
        }
        prev_cmp = cur_cmp;
    }

    match (crossings.first(), crossings.last()) {
        (Some(&first), Some(&last)) => Some((first + last).div_euclid(2)),
        _ => None,
    }
}

pub struct CrossingEstimator;

impl KnowledgeEstimator for CrossingEstimator {
    fn name(&self) -> &'static str {
        "crossing"
    }

    fn estimate(
        &self,
        low: i64,
        high: i64,
        data: &[Observation],
        probability: f64,
    ) -> Option<i64> {
        estimate_rank(data, probability).filter(|rank| *rank > low && *rank < high)
    }
}
