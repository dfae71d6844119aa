use std::path::Path;

use log::info;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::TankyuError,
    persistence::{
        load_json_or_default_from_path,
        save_json_to_path,
    },
};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsConfig {
    /// Learning phase steps, ascending.
    pub learning_steps_secs: Vec<i64>,
    pub success_multiplier: f64,
    pub fail_exponent: f64,
    /// Symmetric multiplicative noise applied to review intervals.
    pub jitter_fraction: f64,
    pub daily_intro_limit: u32,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            learning_steps_secs: vec![60, 600],
            success_multiplier: 2.0,
            fail_exponent: 0.5,
            jitter_fraction: 0.1,
            daily_intro_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Picker,
    Crossing,
    Logistic,
    Irt,
    SlidingWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub intro_known_probability: f64,
    /// Below this many ranked observations the placement rank is used as is.
    pub min_estimator_observations: usize,
    pub estimator: EstimatorKind,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            intro_known_probability: 0.8,
            min_estimator_observations: 4,
            estimator: EstimatorKind::Picker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { url: "https://massif.la/ja/search".to_string(), timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub srs: SrsConfig,
    pub quiz: QuizConfig,
    pub search: SearchConfig,
}

impl EngineConfig {
    pub fn load_from(path: &Path) -> Self {
        load_json_or_default_from_path(path)
    }

    /// Reads `path`, writing the defaults there first if it does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, TankyuError> {
        if path.exists() {
            return Ok(Self::load_from(path));
        }
        let config = Self::default();
        config.save_to(path)?;
        info!("Wrote default config to {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TankyuError> {
        save_json_to_path(self, path)
    }

    /// Rejects values the scheduler and estimators cannot work with.
    pub fn validate(&self) -> Result<(), TankyuError> {
        let invalid = |msg: String| Err(TankyuError::Custom(format!("Invalid config: {}", msg)));

        let p = self.quiz.intro_known_probability;
        if !(p > 0.0 && p < 1.0) {
            return invalid(format!("quiz.intro_known_probability must be in (0, 1), got {}", p));
        }

        let srs = &self.srs;
        if !(0.0..1.0).contains(&srs.jitter_fraction) {
            return invalid(format!("srs.jitter_fraction must be in [0, 1), got {}", srs.jitter_fraction));
        }
        if !(srs.success_multiplier.is_finite() && srs.success_multiplier > 0.0) {
            return invalid(format!(
                "srs.success_multiplier must be positive, got {}",
                srs.success_multiplier
            ));
        }
        if !(srs.fail_exponent.is_finite() && srs.fail_exponent >= 0.0) {
            return invalid(format!("srs.fail_exponent must not be negative, got {}", srs.fail_exponent));
        }
        if srs.learning_steps_secs.first().is_some_and(|&step| step <= 0)
            || srs.learning_steps_secs.windows(2).any(|w| w[0] >= w[1])
        {
            return invalid(format!(
                "srs.learning_steps_secs must be positive and ascending, got {:?}",
                srs.learning_steps_secs
            ));
        }
        Ok(())
    }
}
