//! Online training: one optimizer step per agent per tick.

use lotofacil_model::{FeatureWindow, TrainingError};
use serde::{Deserialize, Serialize};

use crate::{
    agent::{Agent, AgentId},
    draw::{MAX_NUMBER, MIN_NUMBER, NumberSet},
};

/// Which number set the model is fitted against.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum TrainingTarget {
    /// The realized draw.
    #[default]
    #[display("actual")]
    Actual,
    /// The agent's own prediction.
    #[display("prediction")]
    Prediction,
}

/// A fit step failed for one agent. Its previous weights were kept.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("training failed for agent {agent_id} at tick {tick_index}: {source}")]
pub struct AgentTrainingError {
    pub agent_id: AgentId,
    pub tick_index: usize,
    pub source: TrainingError,
}

/// Encodes `numbers` in ascending order as `(n - 1) / 24`.
///
/// This is the inverse of the slot decoding used for predictions, so slot `i`
/// learns the `i`-th smallest number.
#[must_use]
pub fn target_vector(numbers: &NumberSet) -> Vec<f32> {
    let span = f32::from(MAX_NUMBER - MIN_NUMBER);
    numbers
        .sorted()
        .into_iter()
        .map(|n| f32::from(n - MIN_NUMBER) / span)
        .collect()
}

/// Fits the agent's model one step on `window`.
///
/// Returns the loss before the update. The step is atomic: on error the
/// model keeps its previous weights.
pub fn train_step(
    agent: &mut Agent,
    window: &FeatureWindow,
    board: &NumberSet,
    prediction: &NumberSet,
    target: TrainingTarget,
    tick_index: usize,
) -> Result<f32, AgentTrainingError> {
    let numbers = match target {
        TrainingTarget::Actual => board,
        TrainingTarget::Prediction => prediction,
    };
    let target = target_vector(numbers);
    let agent_id = agent.id();
    agent
        .model_mut()
        .fit_step(window, &target)
        .map_err(|source| AgentTrainingError {
            agent_id,
            tick_index,
            source,
        })
}

#[cfg(test)]
mod tests {
    use lotofacil_model::{ModelArchitecture, NetworkLayout};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{draw::DRAW_SIZE, prediction::decode_slot};

    fn agent(features: usize) -> Agent {
        let arch = ModelArchitecture::Dense(NetworkLayout::new(2, features, 4, DRAW_SIZE));
        Agent::new(1, arch.build_random(&mut Pcg32::seed_from_u64(1)))
    }

    fn board() -> NumberSet {
        NumberSet::from_numbers(&[25, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]).unwrap()
    }

    #[test]
    fn test_target_vector_round_trips_through_decoding() {
        let target = target_vector(&board());
        assert_eq!(target.len(), DRAW_SIZE);
        let decoded = target.iter().filter_map(|&v| decode_slot(v)).collect::<Vec<_>>();
        assert_eq!(decoded, board().sorted());
    }

    #[test]
    fn test_train_step_updates_weights() {
        let mut agent = agent(3);
        let before = agent.model().weights();
        let window = FeatureWindow::zeros(2, 3);
        let target = TrainingTarget::Actual;
        let loss = train_step(&mut agent, &window, &board(), &board(), target, 0).unwrap();
        assert!(loss.is_finite());
        assert_ne!(agent.model().weights(), before);
    }

    #[test]
    fn test_train_step_error_carries_context() {
        let mut agent = agent(3);
        let before = agent.model().weights();
        let window = FeatureWindow::zeros(2, 5);
        let target = TrainingTarget::Prediction;
        let err = train_step(&mut agent, &window, &board(), &board(), target, 42).unwrap_err();
        assert_eq!(err.agent_id, 1);
        assert_eq!(err.tick_index, 42);
        assert!(matches!(err.source, TrainingError::Shape(_)));
        assert_eq!(agent.model().weights(), before);
    }
}
