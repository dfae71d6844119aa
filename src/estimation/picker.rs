use std::cmp::Ordering;

use super::{
    fraction_curves,
    rounded_midpoint,
    sorted_observations,
    CurvePoint,
    KnowledgeEstimator,
    Observation,
};

/// Picks a rank in `(low, high)` where the learner should know a word with
/// about `probability`, preferring the middle of untested gaps so the next
/// probe lands where there is no evidence yet.
///
/// The data is padded with a known word at `low` and an unknown word at
/// `high`, so there is always an answer. Input order does not matter.
///
/// # Panics
/// If any observation lies outside `(low, high)` or `probability` is not in `(0, 1)`.
pub fn pick_index(low: i64, high: i64, data: &[Observation], probability: f64) -> i64 {
    let sorted = sorted_observations(data);
    if let (Some(first), Some(last)) = (sorted.first(), sorted.last()) {
        assert!(first.0 > low, "observation at rank {} is not above {}", first.0, low);
        assert!(last.0 < high, "observation at rank {} is not below {}", last.0, high);
    }

    let mut padded = Vec::with_capacity(sorted.len() + 2);
    padded.push((low, true));
    padded.extend(sorted);
    padded.push((high, false));

    let curves = fraction_curves(&padded, probability);
    let mut candidates = Vec::new();
    let mut prev: Option<&CurvePoint> = None;

    for (i, point) in curves.iter().enumerate() {
        let cur_cmp = point.cmp();

        if cur_cmp == Some(Ordering::Equal) {
            candidates.push(rounded_midpoint(point.rank, padded[i + 1].0));
        } else if let (Some(before), Some(Ordering::Less)) = (prev, cur_cmp) {
            if let (Some(Ordering::Greater), Some(before_above), Some(above)) =
                (before.cmp(), before.frac_unknown_above, point.frac_unknown_above)
            {
                // The curves crossed somewhere across this observation; lean
                // towards the side where they meet.
                let mid_known = 0.5 * (point.frac_known_below + before.frac_known_below);
                let mid_unknown = 0.5 * (above + before_above);
                match mid_known.partial_cmp(&mid_unknown) {
                    Some(Ordering::Greater) => {
                        candidates.push(rounded_midpoint(point.rank, padded[i + 1].0))
                    }
                    Some(Ordering::Less) => {
                        candidates.push(rounded_midpoint(point.rank, padded[i - 1].0))
                    }
                    _ => candidates.push(point.rank),
                }
            }
        }

        prev = Some(point);
    }

    match (candidates.first(), candidates.last()) {
        (Some(&first), Some(&last)) => rounded_midpoint(first, last),
        _ => unreachable!("padded observations always cross"),
    }
}

pub struct PickerEstimator;

impl KnowledgeEstimator for PickerEstimator {
    fn name(&self) -> &'static str {
        "picker"
    }

    fn estimate(
        &self,
        low: i64,
        high: i64,
        data: &[Observation],
        probability: f64,
    ) -> Option<i64> {
        Some(pick_index(low, high, data, probability))
    }
}
