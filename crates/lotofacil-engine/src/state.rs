use crate::{draw::Draw, population::Population};

/// Everything a tick reads and writes.
///
/// Mutated only by the tick loop and by explicit operations on
/// [`crate::simulation::Simulation`], which serializes them.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) generation: u32,
    pub(crate) tick_index: usize,
    pub(crate) historical_draws: Vec<Draw>,
    pub(crate) population: Population,
}

impl SimulationState {
    /// A fresh state: generation 1, tick 0, no history.
    #[must_use]
    pub fn new(population: Population) -> Self {
        Self {
            generation: 1,
            tick_index: 0,
            historical_draws: vec![],
            population,
        }
    }

    /// Completed passes over the feed plus one. Never below 1.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Index of the next draw to consume.
    #[must_use]
    pub fn tick_index(&self) -> usize {
        self.tick_index
    }

    /// Draws consumed so far, oldest first.
    #[must_use]
    pub fn historical_draws(&self) -> &[Draw] {
        &self.historical_draws
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }
}
