//! Simulation configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! overrides:
//!
//! ```
//! use lotofacil_engine::config::SimulationConfig;
//!
//! let config: SimulationConfig = serde_json::from_str(r#"{"population_size": 4}"#).unwrap();
//! assert_eq!(config.population_size, 4);
//! assert_eq!(config.window_len, 10);
//! config.validate().unwrap();
//! ```

use lotofacil_model::{ModelArchitecture, ModelKind, NetworkLayout};
use serde::{Deserialize, Serialize};

use crate::{
    draw::{DRAW_SIZE, MAX_NUMBER},
    evolution::CloneScore,
    features::FeatureLayout,
    reward::RewardKind,
    trainer::TrainingTarget,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("window length must be at least 1")]
    EmptyWindow,
    #[display("model budget {budget} exceeds {DRAW_SIZE}")]
    BudgetTooLarge { budget: usize },
    #[display("hot number count {count} exceeds {MAX_NUMBER}")]
    HotCountTooLarge { count: usize },
    #[display("learning rate must be positive and finite, got {value}")]
    LearningRate { value: f32 },
    #[display("hidden unit count must be at least 1")]
    NoHiddenUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population_size: usize,
    /// Number of preceding draws fed to the models.
    pub window_len: usize,
    /// How many hot numbers are tracked and used as fallback picks.
    pub hot_count: usize,
    /// How many leading model output slots may contribute numbers.
    pub model_budget: usize,
    pub reward: RewardKind,
    /// Keep running after a full pass instead of pausing.
    pub infinite_mode: bool,
    pub clone_score: CloneScore,
    pub model: ModelKind,
    pub hidden_units: usize,
    pub learning_rate: f32,
    pub training_target: TrainingTarget,
    pub moving_average_window: usize,
    pub moving_average_inputs: bool,
    /// Seed for weight initialization and random fallback numbers.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            window_len: 10,
            hot_count: 5,
            model_budget: 10,
            reward: RewardKind::default(),
            infinite_mode: false,
            clone_score: CloneScore::default(),
            model: ModelKind::default(),
            hidden_units: 32,
            learning_rate: 0.001,
            training_target: TrainingTarget::default(),
            moving_average_window: 6,
            moving_average_inputs: true,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.window_len == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.model_budget > DRAW_SIZE {
            return Err(ConfigError::BudgetTooLarge {
                budget: self.model_budget,
            });
        }
        if self.hot_count > usize::from(MAX_NUMBER) {
            return Err(ConfigError::HotCountTooLarge { count: self.hot_count });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate {
                value: self.learning_rate,
            });
        }
        if self.hidden_units == 0 {
            return Err(ConfigError::NoHiddenUnits);
        }
        Ok(())
    }

    #[must_use]
    pub fn feature_layout(&self) -> FeatureLayout {
        FeatureLayout {
            window_len: self.window_len,
            moving_average: self.moving_average_inputs,
        }
    }

    /// Architecture of freshly created agent models.
    #[must_use]
    pub fn model_architecture(&self) -> ModelArchitecture {
        let layout = NetworkLayout::new(
            self.window_len,
            self.feature_layout().features_per_step(),
            self.hidden_units,
            DRAW_SIZE,
        )
        .with_learning_rate(self.learning_rate);
        ModelArchitecture::new(self.model, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        let arch = config.model_architecture();
        assert_eq!(arch.kind(), ModelKind::Recurrent);
        assert_eq!(arch.layout().features, 32);
        assert_eq!(arch.layout().outputs, DRAW_SIZE);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = |f: fn(&mut SimulationConfig)| {
            let mut config = SimulationConfig::default();
            f(&mut config);
            config.validate().unwrap_err()
        };
        assert_eq!(bad(|c| c.population_size = 0), ConfigError::EmptyPopulation);
        assert_eq!(bad(|c| c.window_len = 0), ConfigError::EmptyWindow);
        assert_eq!(bad(|c| c.model_budget = 16), ConfigError::BudgetTooLarge { budget: 16 });
        assert_eq!(bad(|c| c.hot_count = 26), ConfigError::HotCountTooLarge { count: 26 });
        assert!(matches!(
            bad(|c| c.learning_rate = -1.0),
            ConfigError::LearningRate { .. }
        ));
        assert_eq!(bad(|c| c.hidden_units = 0), ConfigError::NoHiddenUnits);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"reward": "bonus", "model": "dense", "seed": 7}"#).unwrap();
        assert_eq!(config.reward, RewardKind::Bonus);
        assert_eq!(config.model, ModelKind::Dense);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.population_size, 10);
    }
}
