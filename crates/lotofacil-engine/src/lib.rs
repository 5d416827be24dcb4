//! Population simulation of competing lottery predictor agents.
//!
//! A [`Simulation`] walks a [`DrawFeed`] one draw per tick. On every tick each
//! agent predicts the draw from the draws that preceded it, is rewarded for
//! its matches and then trains one step on the realized draw. After a full
//! pass over the feed the generation advances; the best agent can then be
//! cloned over the whole population.
//!
//! # Tick pipeline
//!
//! ```text
//! DrawFeed ──► history ──► Statistics (frequency, hot numbers, moving average)
//!                              │
//!                              ▼
//!          FeatureLayout::build_window ──► prediction::predict (per agent)
//!                                              │
//!                                              ▼
//!                      RewardPolicy ──► score   trainer::train_step
//! ```
//!
//! # Modules
//!
//! - [`draw`] / [`ingest`]: draw data and CSV parsing
//! - [`statistics`] / [`features`]: derived inputs for the models
//! - [`prediction`] / [`reward`] / [`trainer`]: per-agent work on each tick
//! - [`agent`] / [`population`] / [`evolution`]: the competing agents
//! - [`simulation`] / [`scheduler`]: the tick loop and its driver
//! - [`pretraining`]: offline training of one model over the whole feed
//! - [`snapshot`] / [`config`] / [`telemetry`]: persistence, settings, observers

use lotofacil_model::{LayoutError, ShapeMismatchError, pretrain::PretrainError};

pub use self::{
    draw::{Draw, DrawFeed, NumberSet},
    simulation::{RunState, Simulation, TickReport},
};

use self::{agent::AgentId, config::ConfigError, draw::IndexError, population::PopulationError};

pub mod agent;
pub mod config;
pub mod draw;
pub mod evolution;
pub mod features;
pub mod ingest;
pub mod population;
pub mod prediction;
pub mod pretraining;
pub mod reward;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod state;
pub mod statistics;
pub mod telemetry;
pub mod trainer;

/// An error that stops the tick loop. The failed tick left no trace in the state.
#[derive(
    Debug, derive_more::Display, derive_more::Error, derive_more::From, derive_more::IsVariant,
)]
pub enum SimulationError {
    #[display("invalid configuration: {_0}")]
    #[from]
    Config(ConfigError),
    #[display("draw feed is empty")]
    EmptyFeed,
    #[display("{_0}")]
    #[from]
    Index(IndexError),
    #[display("inference failed for agent {agent_id} at tick {tick_index}: {source}")]
    Inference {
        agent_id: AgentId,
        tick_index: usize,
        source: ShapeMismatchError,
    },
    #[display("population invariant violated: {_0}")]
    #[from]
    Population(PopulationError),
    #[display("model does not fit the configured layout: {_0}")]
    IncompatibleModel(ShapeMismatchError),
    #[display("model layout is unusable: {_0}")]
    InvalidModel(LayoutError),
    #[display("pre-training failed: {_0}")]
    #[from]
    Pretrain(PretrainError),
    #[display("simulation is not running ({state})")]
    NotRunning { state: RunState },
}
