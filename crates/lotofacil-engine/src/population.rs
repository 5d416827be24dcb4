//! The competing agents.
//!
//! A population is an ordered list of agents with unique, stable ids
//! `1..=N`. Its size only changes when the whole population is replaced by
//! [`crate::evolution::clone_best`], a snapshot load or a reset.

use std::collections::HashSet;

use lotofacil_model::{Model, ModelArchitecture};
use lotofacil_stats::descriptive::DescriptiveStats;
use rand::Rng;

use crate::agent::{Agent, AgentId};

/// A population invariant no longer holds.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PopulationError {
    #[display("population is empty")]
    Empty,
    #[display("population size changed from {expected} to {found}")]
    SizeChanged { expected: usize, found: usize },
    #[display("agent id {id} appears more than once")]
    DuplicateId { id: AgentId },
    #[display("agent {id} has a non-finite score")]
    NonFiniteScore { id: AgentId },
}

#[derive(Debug, Clone)]
pub struct Population {
    agents: Vec<Agent>,
}

fn agent_ids(count: usize) -> impl Iterator<Item = AgentId> {
    (1..).take(count)
}

impl Population {
    /// Creates `count` agents with freshly initialized models.
    pub fn random<R>(architecture: &ModelArchitecture, count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let agents = agent_ids(count)
            .map(|id| Agent::new(id, architecture.build_random(&mut *rng)))
            .collect();
        Self { agents }
    }

    /// Creates `count` agents, each with an independent copy of `model`.
    #[must_use]
    pub fn from_model(model: &dyn Model, count: usize, score: f64) -> Self {
        let agents = agent_ids(count)
            .map(|id| Agent::from_model(id, model, score))
            .collect();
        Self { agents }
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The agent with the highest score; ties go to the lowest id.
    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        self.agents.iter().max_by(|a, b| {
            a.score()
                .total_cmp(&b.score())
                .then_with(|| b.id().cmp(&a.id()))
        })
    }

    /// Summary of the agents' scores.
    #[must_use]
    pub fn score_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.agents.iter().map(Agent::score))
    }

    /// Checks the size, id uniqueness and score finiteness invariants.
    pub fn validate(&self, expected_size: usize) -> Result<(), PopulationError> {
        if self.agents.is_empty() {
            return Err(PopulationError::Empty);
        }
        if self.agents.len() != expected_size {
            return Err(PopulationError::SizeChanged {
                expected: expected_size,
                found: self.agents.len(),
            });
        }
        let mut seen = HashSet::with_capacity(self.agents.len());
        for agent in &self.agents {
            if !seen.insert(agent.id()) {
                return Err(PopulationError::DuplicateId { id: agent.id() });
            }
            if !agent.score().is_finite() {
                return Err(PopulationError::NonFiniteScore { id: agent.id() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lotofacil_model::NetworkLayout;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::draw::NumberSet;

    fn population(count: usize) -> Population {
        let arch = ModelArchitecture::Dense(NetworkLayout::new(1, 2, 3, 4));
        Population::random(&arch, count, &mut Pcg32::seed_from_u64(5))
    }

    #[test]
    fn test_ids_are_one_based_and_unique() {
        let pop = population(4);
        let ids = pop.agents().iter().map(Agent::id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(pop.validate(4).is_ok());
        assert_eq!(
            pop.validate(5),
            Err(PopulationError::SizeChanged {
                expected: 5,
                found: 4
            })
        );
    }

    #[test]
    fn test_best_agent_tie_breaks_by_lowest_id() {
        let mut pop = population(3);
        pop.agents_mut()[2].record(NumberSet::new(), 2.0);
        pop.agents_mut()[1].record(NumberSet::new(), 2.0);
        assert_eq!(pop.best_agent().map(Agent::id), Some(2));

        pop.agents_mut()[2].record(NumberSet::new(), 0.5);
        assert_eq!(pop.best_agent().map(Agent::id), Some(3));
    }

    #[test]
    fn test_best_agent_with_negative_scores() {
        let mut pop = population(2);
        pop.agents_mut()[0].record(NumberSet::new(), -1.0);
        pop.agents_mut()[1].record(NumberSet::new(), -0.5);
        assert_eq!(pop.best_agent().map(Agent::id), Some(2));
    }

    #[test]
    fn test_validate_rejects_non_finite_score() {
        let mut pop = population(2);
        pop.agents_mut()[1].record(NumberSet::new(), f64::NAN);
        assert_eq!(pop.validate(2), Err(PopulationError::NonFiniteScore { id: 2 }));
    }

    #[test]
    fn test_from_model_copies_weights() {
        let source = population(1);
        let model = source.agents()[0].model();
        let pop = Population::from_model(model, 3, 1.5);
        for agent in pop.agents() {
            assert_eq!(agent.model().weights(), model.weights());
            assert!((agent.score() - 1.5).abs() < f64::EPSILON);
        }
        assert!(Population::from_model(model, 0, 0.0).validate(0).is_err());
    }
}
