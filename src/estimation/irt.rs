use std::f64::consts::PI;

use super::{
    KnowledgeEstimator,
    Observation,
};
use crate::core::utils::round_half_up;

/// One-parameter item response model. Word difficulty is `ln(rank)` and
/// learner ability lives on the same scale.
#[derive(Debug, Clone, PartialEq)]
pub struct IrtConfig {
    /// Slope shared by every item.
    pub item_discrim: f64,
    pub prior_mean: f64,
    pub prior_stddev: f64,
    pub prior_min: f64,
    pub prior_max: f64,
    pub sample_points: usize,
    pub mle_climb_iters: usize,
}

impl Default for IrtConfig {
    fn default() -> Self {
        Self {
            item_discrim: 1.0,
            prior_mean: 7.0,
            prior_stddev: 2.0,
            prior_min: 0.0,
            prior_max: 11.0,
            sample_points: 30,
            mle_climb_iters: 20,
        }
    }
}

impl IrtConfig {
    fn ability_grid(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.grid_step();
        (0..self.sample_points).map(move |i| self.prior_min + i as f64 * step)
    }

    fn grid_step(&self) -> f64 {
        (self.prior_max - self.prior_min) / (self.sample_points.max(2) - 1) as f64
    }
}

pub fn rank_to_difficulty(rank: i64) -> f64 {
    (rank.max(1) as f64).ln()
}

pub fn difficulty_to_rank(difficulty: f64) -> f64 {
    difficulty.exp()
}

fn normal_pdf(x: f64, mean: f64, stddev: f64) -> f64 {
    let z = (x - mean) / stddev;
    (-0.5 * z * z).exp() / (stddev * (2.0 * PI).sqrt())
}

fn item_response(difficulty: f64, ability: f64, discrim: f64) -> f64 {
    1.0 / (1.0 + (discrim * (difficulty - ability)).exp())
}

fn likelihood(data: &[Observation], ability: f64, config: &IrtConfig) -> f64 {
    data.iter()
        .map(|&(rank, known)| {
            let p = item_response(rank_to_difficulty(rank), ability, config.item_discrim);
            if known {
                p
            } else {
                1.0 - p
            }
        })
        .product()
}

/// Expected a posteriori ability under the normal prior; defined even with no data.
pub fn estimate_ability_eap(data: &[Observation], config: &IrtConfig) -> f64 {
    let (num, denom) = config.ability_grid().fold((0.0, 0.0), |(num, denom), ability| {
        let weight = likelihood(data, ability, config)
            * normal_pdf(ability, config.prior_mean, config.prior_stddev);
        (num + ability * weight, denom + weight)
    });
    num / denom
}

/// Maximum likelihood ability: best grid sample, refined by halving hill
/// climbs. Only meaningful with at least one known and one unknown word.
pub fn estimate_ability_mle(data: &[Observation], config: &IrtConfig) -> f64 {
    let mut best_ability = config.prior_min;
    let mut best_like = f64::NEG_INFINITY;
    for ability in config.ability_grid() {
        let like = likelihood(data, ability, config);
        if like > best_like {
            best_like = like;
            best_ability = ability;
        }
    }

    let mut climb_step = 0.5 * config.grid_step();
    for _ in 0..config.mle_climb_iters {
        for candidate in [best_ability + climb_step, best_ability - climb_step] {
            let like = likelihood(data, candidate, config);
            if like > best_like {
                best_like = like;
                best_ability = candidate;
                break;
            }
        }
        climb_step *= 0.5;
    }

    best_ability
}

/// Rank where the learner knows a word with `probability`, from an ability.
pub fn rank_for_probability(ability: f64, probability: f64, discrim: f64) -> f64 {
    difficulty_to_rank(ability + ((1.0 - probability) / probability).ln() / discrim)
}

#[derive(Default)]
pub struct IrtEstimator {
    pub config: IrtConfig,
}

impl KnowledgeEstimator for IrtEstimator {
    fn name(&self) -> &'static str {
        "irt"
    }

    fn estimate(
        &self,
        low: i64,
        high: i64,
        data: &[Observation],
        probability: f64,
    ) -> Option<i64> {
        assert!(probability > 0.0 && probability < 1.0, "probability must be in (0, 1)");
        if high - low < 2 {
            return None;
        }
        let ability = estimate_ability_eap(data, &self.config);
        let rank = rank_for_probability(ability, probability, self.config.item_discrim);
        rank.is_finite().then(|| (round_half_up(rank) as i64).clamp(low + 1, high - 1))
    }
}
