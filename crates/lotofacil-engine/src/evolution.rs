//! Selection and cloning between generations.
//!
//! The single best agent is selected and, on request, copied over the whole
//! population. There is no crossover or mutation: clones diverge again
//! through their own online training.

use serde::{Deserialize, Serialize};

use crate::{agent::Agent, population::Population, state::SimulationState};

/// Starting score of the agents produced by [`clone_best`].
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
pub enum CloneScore {
    /// Every clone starts at zero.
    #[default]
    #[display("reset")]
    Reset,
    /// Every clone starts at the best agent's score.
    #[display("inherit")]
    Inherit,
}

/// The agent with the maximum score, lowest id on ties.
#[must_use]
pub fn best_agent(population: &Population) -> Option<&Agent> {
    population.best_agent()
}

/// Replaces the population with independent deep copies of its best agent.
///
/// The new agents get ids `1..=N` where `N` is the current size. Returns
/// `None` for an empty population.
#[must_use]
pub fn clone_best(population: &Population, score: CloneScore) -> Option<Population> {
    let best = population.best_agent()?;
    let start = match score {
        CloneScore::Reset => 0.0,
        CloneScore::Inherit => best.score(),
    };
    Some(Population::from_model(best.model(), population.len(), start))
}

/// Advances the generation counter. Population composition is untouched.
pub fn evolve_generation(state: &mut SimulationState) -> u32 {
    state.generation = state.generation.saturating_add(1);
    state.generation
}

#[cfg(test)]
mod tests {
    use lotofacil_model::{FeatureWindow, ModelArchitecture, NetworkLayout};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::draw::NumberSet;

    fn population() -> Population {
        let arch = ModelArchitecture::Recurrent(NetworkLayout::new(2, 3, 4, 5));
        let mut pop = Population::random(&arch, 4, &mut Pcg32::seed_from_u64(8));
        pop.agents_mut()[2].record(NumberSet::new(), 3.0);
        pop
    }

    #[test]
    fn test_clone_best_copies_weights() {
        let pop = population();
        let best = best_agent(&pop).unwrap();
        assert_eq!(best.id(), 3);

        let clones = clone_best(&pop, CloneScore::Reset).unwrap();
        assert_eq!(clones.len(), 4);
        for (agent, id) in clones.agents().iter().zip(1..) {
            assert_eq!(agent.id(), id);
            assert_eq!(agent.model().weights(), best.model().weights());
            assert!(agent.score().abs() < f64::EPSILON);
            assert!(agent.last_prediction().is_none());
        }
    }

    #[test]
    fn test_clone_best_inherit_score() {
        let clones = clone_best(&population(), CloneScore::Inherit).unwrap();
        assert!(clones.agents().iter().all(|a| (a.score() - 3.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_clones_are_independent() {
        let mut clones = clone_best(&population(), CloneScore::Reset).unwrap();
        let window = FeatureWindow::zeros(2, 3);
        clones.agents_mut()[0]
            .model_mut()
            .fit_step(&window, &[1.0; 5])
            .unwrap();
        let agents = clones.agents();
        assert_ne!(agents[0].model().weights(), agents[1].model().weights());
        assert_eq!(agents[1].model().weights(), agents[2].model().weights());
    }

    #[test]
    fn test_evolve_generation_only_counts() {
        let mut state = SimulationState::new(population());
        assert_eq!(evolve_generation(&mut state), 2);
        assert_eq!(state.population().len(), 4);
    }
}
