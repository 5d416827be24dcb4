//! The tick loop and the operations that may interleave with it.
//!
//! # State machine
//!
//! ```text
//!          start             full pass (infinite mode off)
//!   Idle ─────────► Running ─────────────────────────────► Paused
//!    ▲                │  ▲                                   │
//!    └──── stop ──────┘  └──────────────── resume ───────────┘
//! ```
//!
//! # One tick
//!
//! 1. Fetch the draw at `tick_index` and append it to the history
//! 2. Recompute statistics over the whole history
//! 3. Build the input window from the draws preceding this one
//! 4. Predict for every agent
//! 5. Score every prediction, accumulate rewards and train one step
//! 6. Record one history row per agent and advance `tick_index`
//!
//! A tick is all-or-nothing for fatal errors: if any step up to 4 fails the
//! appended draw is removed and no agent is touched. A training failure is
//! local to its agent (the agent keeps its previous weights) and is reported
//! in the [`TickReport`].

use std::fmt;

use lotofacil_model::{FeatureWindow, Model, ModelArchitecture, ShapeMismatchError};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    SimulationError,
    agent::{Agent, AgentId},
    config::SimulationConfig,
    draw::{Draw, DrawFeed, NumberSet},
    evolution,
    features::{Clock, SystemClock},
    population::{Population, PopulationError},
    prediction::{self, Prediction},
    reward::BoxedRewardPolicy,
    snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotError},
    state::SimulationState,
    statistics::Statistics,
    telemetry::{PredictionTelemetry, TelemetrySink},
    trainer::{self, AgentTrainingError},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum RunState {
    #[default]
    #[display("idle")]
    Idle,
    #[display("running")]
    Running,
    #[display("paused")]
    Paused,
}

/// One agent's score after one tick, for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub generation: u32,
    pub tick_index: usize,
    pub agent_id: AgentId,
    pub score: f64,
}

/// What happened to one agent during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub agent_id: AgentId,
    pub prediction: NumberSet,
    pub matches: usize,
    pub reward: f64,
    /// Score after adding `reward`.
    pub score: f64,
    /// Loss of the training step, `None` if it was rejected.
    pub loss: Option<f32>,
}

/// Result of one successful tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Generation the tick belonged to.
    pub generation: u32,
    /// Feed index of the consumed draw.
    pub tick_index: usize,
    pub draw: Draw,
    pub hot_numbers: Vec<u8>,
    /// One entry per agent, in population order.
    pub outcomes: Vec<AgentOutcome>,
    pub training_failures: Vec<AgentTrainingError>,
    /// The tick finished a full pass over the feed.
    pub generation_completed: bool,
}

struct PreparedTick {
    hot_numbers: Vec<u8>,
    window: FeatureWindow,
    predictions: Vec<Prediction>,
}

/// A population of agents competing over a draw feed.
pub struct Simulation {
    config: SimulationConfig,
    feed: DrawFeed,
    state: SimulationState,
    run_state: RunState,
    history: Vec<HistoryRow>,
    reward: BoxedRewardPolicy,
    rng: Pcg32,
    clock: Box<dyn Clock>,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("feed_len", &self.feed.len())
            .field("generation", &self.state.generation)
            .field("tick_index", &self.state.tick_index)
            .field("run_state", &self.run_state)
            .field("reward", &self.reward)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an idle simulation with a fresh random population.
    pub fn new(config: SimulationConfig, feed: DrawFeed) -> Result<Self, SimulationError> {
        config.validate()?;
        if feed.is_empty() {
            return Err(SimulationError::EmptyFeed);
        }
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);
        let population =
            Population::random(&config.model_architecture(), config.population_size, &mut rng);
        info!(
            seed,
            population_size = config.population_size,
            model = %config.model,
            reward = %config.reward,
            feed_len = feed.len(),
            "simulation created"
        );
        Ok(Self {
            reward: config.reward.policy(),
            config,
            feed,
            state: SimulationState::new(population),
            run_state: RunState::Idle,
            history: vec![],
            rng,
            clock: Box::new(SystemClock),
            telemetry: None,
        })
    }

    /// Replaces the wall clock used for the timestamp feature.
    #[must_use]
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the population with independent copies of `model`.
    pub fn with_initial_model(mut self, model: &dyn Model) -> Result<Self, SimulationError> {
        let architecture = model.architecture();
        architecture
            .layout()
            .validate()
            .map_err(SimulationError::InvalidModel)?;
        self.check_architecture(&architecture)
            .map_err(SimulationError::IncompatibleModel)?;
        self.state.population = Population::from_model(model, self.config.population_size, 0.0);
        Ok(self)
    }

    /// Installs or removes the prediction telemetry sink.
    pub fn set_telemetry_sink(&mut self, sink: Option<Box<dyn TelemetrySink>>) {
        self.telemetry = sink;
    }

    /// Replaces the reward policy selected by the configuration.
    pub fn set_reward_policy(&mut self, policy: BoxedRewardPolicy) {
        self.reward = policy;
    }

    pub fn set_infinite_mode(&mut self, enabled: bool) {
        self.config.infinite_mode = enabled;
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn feed(&self) -> &DrawFeed {
        &self.feed
    }

    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Per-tick score rows, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryRow] {
        &self.history
    }

    /// Fraction of the current pass already consumed, in `[0, 1)`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        #[expect(clippy::cast_precision_loss)]
        let progress = self.state.tick_index as f64 / self.feed.len() as f64;
        progress
    }

    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        evolution::best_agent(&self.state.population)
    }

    pub fn start(&mut self) {
        if !self.run_state.is_running() {
            self.run_state = RunState::Running;
            info!(
                generation = self.state.generation,
                tick_index = self.state.tick_index,
                "simulation started"
            );
        }
    }

    /// Pauses a running simulation. Returns `false` if it was not running.
    pub fn pause(&mut self) -> bool {
        if !self.run_state.is_running() {
            return false;
        }
        self.run_state = RunState::Paused;
        info!(tick_index = self.state.tick_index, "simulation paused");
        true
    }

    /// Resumes a paused simulation. Returns `false` if it was not paused.
    pub fn resume(&mut self) -> bool {
        if !self.run_state.is_paused() {
            return false;
        }
        self.run_state = RunState::Running;
        info!(
            generation = self.state.generation,
            tick_index = self.state.tick_index,
            "simulation resumed"
        );
        true
    }

    pub fn stop(&mut self) {
        self.run_state = RunState::Idle;
    }

    /// Discards all progress: fresh population, generation 1, tick 0, no history.
    pub fn reset(&mut self) {
        let population = Population::random(
            &self.config.model_architecture(),
            self.config.population_size,
            &mut self.rng,
        );
        self.state = SimulationState::new(population);
        self.history.clear();
        self.run_state = RunState::Idle;
        info!("simulation reset");
    }

    /// Advances the generation counter without touching the population.
    pub fn evolve_generation(&mut self) -> u32 {
        let generation = evolution::evolve_generation(&mut self.state);
        info!(generation, "generation advanced");
        generation
    }

    /// Replaces every agent with an independent copy of the best one.
    pub fn clone_best(&mut self) -> Result<(), SimulationError> {
        let best = self.best_agent().map(|agent| (agent.id(), agent.score()));
        let population = evolution::clone_best(&self.state.population, self.config.clone_score)
            .ok_or(PopulationError::Empty)?;
        self.state.population = population;
        if let Some((agent_id, score)) = best {
            info!(
                agent_id,
                score,
                generation = self.state.generation,
                clone_score = %self.config.clone_score,
                "population cloned from best agent"
            );
        }
        Ok(())
    }

    /// Runs one tick. The simulation must be running.
    pub fn tick(&mut self) -> Result<TickReport, SimulationError> {
        if !self.run_state.is_running() {
            return Err(SimulationError::NotRunning { state: self.run_state });
        }
        self.state.population.validate(self.config.population_size)?;

        let index = self
            .state
            .tick_index
            .checked_rem(self.feed.len())
            .ok_or(SimulationError::EmptyFeed)?;
        let draw = self.feed.get(index)?.clone();

        self.state.historical_draws.push(draw.clone());
        let prepared = match self.prepare(index) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.state.historical_draws.pop();
                return Err(err);
            }
        };
        self.emit_telemetry(index, &prepared);
        Ok(self.commit(index, draw, prepared))
    }

    /// Computes every prediction without mutating any agent.
    fn prepare(&mut self, index: usize) -> Result<PreparedTick, SimulationError> {
        let history = &self.state.historical_draws;
        let stats = Statistics::update(
            history,
            self.config.hot_count,
            self.config.moving_average_window,
        );
        let preceding = history.split_last().map_or(&[][..], |(_, rest)| rest);
        let window = self.config.feature_layout().build_window(
            preceding,
            stats.moving_average(),
            index,
            self.feed.len(),
            self.clock.now(),
        );

        let mut predictions = Vec::with_capacity(self.state.population.len());
        for agent in self.state.population.agents() {
            let prediction = prediction::predict(
                agent.model(),
                &window,
                self.config.model_budget,
                stats.hot_numbers(),
                &mut self.rng,
            )
            .map_err(|source| SimulationError::Inference {
                agent_id: agent.id(),
                tick_index: index,
                source,
            })?;
            predictions.push(prediction);
        }

        Ok(PreparedTick {
            hot_numbers: stats.hot_numbers().to_vec(),
            window,
            predictions,
        })
    }

    fn emit_telemetry(&mut self, index: usize, prepared: &PreparedTick) {
        let Some(sink) = &mut self.telemetry else {
            return;
        };
        let agents = self.state.population.agents();
        for (agent, prediction) in agents.iter().zip(&prepared.predictions) {
            sink.record(&PredictionTelemetry {
                agent_id: agent.id(),
                tick_index: index,
                input: prepared.window.values().to_vec(),
                output: prediction.numbers.as_slice().to_vec(),
                weights: agent.model().weights(),
            });
        }
    }

    /// Scores, trains and records every agent, then advances the counters.
    fn commit(&mut self, index: usize, draw: Draw, prepared: PreparedTick) -> TickReport {
        let generation = self.state.generation;
        let mut outcomes = Vec::with_capacity(prepared.predictions.len());
        let mut training_failures = vec![];

        let agents = self.state.population.agents_mut().iter_mut();
        for (agent, prediction) in agents.zip(prepared.predictions) {
            let matches = prediction.numbers.intersection_count(draw.numbers());
            let reward = self.reward.reward(matches, &prepared.hot_numbers, draw.numbers());
            agent.record(prediction.numbers.clone(), reward);

            let loss = match trainer::train_step(
                agent,
                &prepared.window,
                draw.numbers(),
                &prediction.numbers,
                self.config.training_target,
                index,
            ) {
                Ok(loss) => Some(loss),
                Err(err) => {
                    warn!(
                        agent_id = err.agent_id,
                        tick_index = err.tick_index,
                        generation,
                        error = %err.source,
                        "training step rejected, keeping previous weights"
                    );
                    training_failures.push(err);
                    None
                }
            };

            debug!(
                agent_id = agent.id(),
                tick_index = index,
                generation,
                matches,
                reward,
                score = agent.score(),
                "agent scored"
            );
            self.history.push(HistoryRow {
                generation,
                tick_index: index,
                agent_id: agent.id(),
                score: agent.score(),
            });
            outcomes.push(AgentOutcome {
                agent_id: agent.id(),
                prediction: prediction.numbers,
                matches,
                reward,
                score: agent.score(),
                loss,
            });
        }

        self.state.tick_index = (index + 1) % self.feed.len();
        let generation_completed = self.state.tick_index == 0;
        if generation_completed {
            let next = evolution::evolve_generation(&mut self.state);
            let best_score = self.best_agent().map(Agent::score);
            info!(generation = next, ?best_score, "generation completed");
            if !self.config.infinite_mode {
                self.run_state = RunState::Paused;
                info!(generation = next, "paused after full pass");
            }
        }
        debug!(
            tick_index = index,
            generation,
            contest_index = draw.contest_index(),
            "tick completed"
        );

        TickReport {
            generation,
            tick_index: index,
            draw,
            hot_numbers: prepared.hot_numbers,
            outcomes,
            training_failures,
            generation_completed,
        }
    }

    /// Captures the best agent's model, the history and the counters.
    pub fn save(&self) -> Result<Snapshot, SimulationError> {
        let best = self.best_agent().ok_or(PopulationError::Empty)?;
        let model = best.model().snapshot();
        Ok(Snapshot {
            version: Some(SNAPSHOT_VERSION),
            model_architecture: Some(model.architecture),
            model_weights: model.weights,
            historical_draws: Some(self.state.historical_draws.clone()),
            generation: Some(self.state.generation),
            tick_index: Some(self.state.tick_index),
            saved_at: Some(self.clock.now()),
            best_score: Some(best.score()),
        })
    }

    /// Parses and restores a snapshot. See [`Self::restore`].
    pub fn load(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot = Snapshot::from_json(json)?;
        self.restore(&snapshot)
    }

    /// Replaces the population with clones of the snapshot's model and
    /// restores whichever counters and history the snapshot carries.
    ///
    /// Everything is validated before anything is replaced: on error the
    /// simulation is unchanged.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let model = snapshot.restore_model()?;
        self.check_architecture(&model.architecture())?;
        if snapshot.generation == Some(0) {
            return Err(SnapshotError::InvalidField {
                field: "generation",
                reason: "must be at least 1".to_owned(),
            });
        }
        let population = Population::from_model(model.as_ref(), self.config.population_size, 0.0);

        self.state.population = population;
        if let Some(generation) = snapshot.generation {
            self.state.generation = generation;
        }
        if let Some(tick_index) = snapshot.tick_index {
            self.state.tick_index = tick_index % self.feed.len();
        }
        if let Some(draws) = &snapshot.historical_draws {
            self.state.historical_draws.clone_from(draws);
        }
        info!(
            generation = self.state.generation,
            tick_index = self.state.tick_index,
            history_len = self.state.historical_draws.len(),
            model = %model.architecture().kind(),
            "snapshot loaded"
        );
        Ok(())
    }

    /// Checks that `architecture` accepts the configured input window and
    /// produces one output per drawn number. Family and hidden size may differ.
    fn check_architecture(
        &self,
        architecture: &ModelArchitecture,
    ) -> Result<(), ShapeMismatchError> {
        let expected = self.config.model_architecture();
        let (expected, found) = (expected.layout(), architecture.layout());
        ShapeMismatchError::check("window steps", expected.steps, found.steps)?;
        ShapeMismatchError::check("features per step", expected.features, found.features)?;
        ShapeMismatchError::check("output slots", expected.outputs, found.outputs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use chrono::{TimeZone as _, Utc};
    use lotofacil_model::{BoxedModel, TrainingError};

    use super::*;
    use crate::{
        draw::{DRAW_SIZE, tests::sample_feed},
        features::FixedClock,
        reward::{RewardKind, RewardPolicy, Strict},
    };

    const FEED_LEN: usize = 12;

    fn config() -> SimulationConfig {
        SimulationConfig {
            population_size: 3,
            window_len: 3,
            hidden_units: 8,
            seed: Some(1),
            ..SimulationConfig::default()
        }
    }

    fn simulation_with(config: SimulationConfig) -> Simulation {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Simulation::new(config, sample_feed(FEED_LEN)).unwrap().with_clock(clock)
    }

    fn running() -> Simulation {
        let mut sim = simulation_with(config());
        sim.start();
        sim
    }

    /// Model with scripted failures.
    #[derive(Debug, Clone)]
    struct ScriptedModel {
        architecture: ModelArchitecture,
        fail_predict: bool,
        fail_fit: bool,
    }

    impl Model for ScriptedModel {
        fn architecture(&self) -> ModelArchitecture {
            self.architecture
        }

        fn predict(&self, _input: &FeatureWindow) -> Result<Vec<f32>, ShapeMismatchError> {
            if self.fail_predict {
                return Err(ShapeMismatchError {
                    context: "scripted".to_owned(),
                    expected: 1,
                    found: 0,
                });
            }
            Ok(vec![0.5; DRAW_SIZE])
        }

        fn fit_step(
            &mut self,
            _input: &FeatureWindow,
            _target: &[f32],
        ) -> Result<f32, TrainingError> {
            if self.fail_fit {
                return Err(TrainingError::NonFinite { what: "loss" });
            }
            Ok(0.0)
        }

        fn weights(&self) -> Vec<Vec<f32>> {
            vec![]
        }

        fn set_weights(&mut self, _weights: &[Vec<f32>]) -> Result<(), ShapeMismatchError> {
            Ok(())
        }

        fn clone_boxed(&self) -> BoxedModel {
            Box::new(self.clone())
        }
    }

    fn scripted(fail_predict: bool, fail_fit: bool) -> Simulation {
        let model = ScriptedModel {
            architecture: config().model_architecture(),
            fail_predict,
            fail_fit,
        };
        let mut sim = simulation_with(config()).with_initial_model(&model).unwrap();
        sim.start();
        sim
    }

    #[test]
    fn test_new_rejects_empty_feed_and_bad_config() {
        assert!(Simulation::new(config(), DrawFeed::default()).unwrap_err().is_empty_feed());
        let bad = SimulationConfig {
            population_size: 0,
            ..config()
        };
        assert!(Simulation::new(bad, sample_feed(3)).unwrap_err().is_config());
    }

    #[test]
    fn test_tick_requires_running() {
        let mut sim = simulation_with(config());
        let err = sim.tick().unwrap_err();
        assert!(err.is_not_running());
        assert!(sim.state().historical_draws().is_empty());
    }

    #[test]
    fn test_tick_produces_valid_predictions_and_history() {
        let mut sim = running();
        let report = sim.tick().unwrap();
        assert_eq!(report.tick_index, 0);
        assert_eq!(report.generation, 1);
        assert_eq!(report.outcomes.len(), 3);
        for outcome in &report.outcomes {
            assert_eq!(outcome.prediction.len(), DRAW_SIZE);
            let matches = outcome.prediction.intersection_count(report.draw.numbers());
            assert_eq!(outcome.matches, matches);
            assert!(outcome.loss.is_some());
        }
        assert_eq!(sim.history().len(), 3);
        assert_eq!(sim.state().historical_draws().len(), 1);
        assert_eq!(sim.state().tick_index(), 1);
        for agent in sim.state().population().agents() {
            assert!(agent.last_prediction().is_some());
        }
    }

    #[test]
    fn test_score_is_sum_of_recomputed_rewards() {
        let mut sim = simulation_with(SimulationConfig {
            reward: RewardKind::Bonus,
            ..config()
        });
        sim.start();
        let mut expected = vec![0.0; 3];
        let policy = RewardKind::Bonus.policy();
        for _ in 0..5 {
            let report = sim.tick().unwrap();
            for (i, outcome) in report.outcomes.iter().enumerate() {
                let board = report.draw.numbers();
                expected[i] += policy.reward(outcome.matches, &report.hot_numbers, board);
            }
        }
        for (agent, expected) in sim.state().population().agents().iter().zip(expected) {
            assert!((agent.score() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_best_agent_dominates_after_ticks() {
        let mut sim = running();
        sim.set_reward_policy(Box::new(MatchCount));
        for _ in 0..4 {
            sim.tick().unwrap();
            let best = sim.best_agent().unwrap();
            for agent in sim.state().population().agents() {
                assert!(best.score() >= agent.score());
            }
        }
    }

    #[derive(Debug)]
    struct MatchCount;

    impl RewardPolicy for MatchCount {
        #[expect(clippy::cast_precision_loss)]
        fn reward(&self, matches: usize, _hot_numbers: &[u8], _board: &NumberSet) -> f64 {
            matches as f64
        }
    }

    #[test]
    fn test_full_pass_advances_generation_and_pauses() {
        let mut sim = running();
        for i in 0..FEED_LEN {
            let report = sim.tick().unwrap();
            assert_eq!(report.generation_completed, i == FEED_LEN - 1);
        }
        assert_eq!(sim.state().generation(), 2);
        assert_eq!(sim.state().tick_index(), 0);
        assert_eq!(sim.run_state(), RunState::Paused);
        assert!(sim.tick().unwrap_err().is_not_running());

        assert!(sim.resume());
        let report = sim.tick().unwrap();
        assert_eq!(report.tick_index, 0);
        assert_eq!(report.generation, 2);
        assert_eq!(sim.state().historical_draws().len(), FEED_LEN + 1);
    }

    #[test]
    fn test_infinite_mode_keeps_running() {
        let mut sim = running();
        sim.set_infinite_mode(true);
        for _ in 0..FEED_LEN * 2 {
            sim.tick().unwrap();
        }
        assert_eq!(sim.state().generation(), 3);
        assert!(sim.run_state().is_running());
    }

    #[test]
    fn test_pause_resume_and_stop() {
        let mut sim = running();
        assert!(!sim.resume());
        assert!(sim.pause());
        assert!(!sim.pause());
        assert!(sim.resume());
        sim.stop();
        assert_eq!(sim.run_state(), RunState::Idle);
    }

    #[test]
    fn test_progress() {
        let mut sim = running();
        for _ in 0..3 {
            sim.tick().unwrap();
        }
        assert!((sim.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inference_failure_rolls_back_tick() {
        let mut sim = scripted(true, false);
        let err = sim.tick().unwrap_err();
        assert!(matches!(err, SimulationError::Inference { agent_id: 1, tick_index: 0, .. }));
        assert!(sim.state().historical_draws().is_empty());
        assert_eq!(sim.state().tick_index(), 0);
        assert!(sim.history().is_empty());
        assert!(sim.state().population().agents().iter().all(|a| a.last_prediction().is_none()));
    }

    #[test]
    fn test_training_failure_is_local() {
        let mut sim = scripted(false, true);
        let report = sim.tick().unwrap();
        assert_eq!(report.training_failures.len(), 3);
        assert!(report.outcomes.iter().all(|o| o.loss.is_none()));
        assert_eq!(sim.history().len(), 3);
        assert_eq!(sim.state().tick_index(), 1);
    }

    #[test]
    fn test_initial_model_must_fit_layout() {
        let model = ScriptedModel {
            architecture: SimulationConfig {
                window_len: 4,
                ..config()
            }
            .model_architecture(),
            fail_predict: false,
            fail_fit: false,
        };
        let err = simulation_with(config()).with_initial_model(&model).unwrap_err();
        assert!(err.is_incompatible_model());
    }

    #[test]
    fn test_initial_model_must_have_usable_layout() {
        let architecture = config().model_architecture();
        let layout = architecture.layout().with_learning_rate(f32::NAN);
        let model = ScriptedModel {
            architecture: ModelArchitecture::new(architecture.kind(), layout),
            fail_predict: false,
            fail_fit: false,
        };
        let err = simulation_with(config()).with_initial_model(&model).unwrap_err();
        assert!(err.is_invalid_model());
    }

    #[test]
    fn test_clone_best_resets_scores() {
        let mut sim = running();
        sim.set_reward_policy(Box::new(MatchCount));
        sim.tick().unwrap();
        let best_weights = sim.best_agent().unwrap().model().weights();
        sim.clone_best().unwrap();
        for agent in sim.state().population().agents() {
            assert!(agent.score().abs() < f64::EPSILON);
            assert_eq!(agent.model().weights(), best_weights);
        }
    }

    #[test]
    fn test_reset() {
        let mut sim = running();
        for _ in 0..FEED_LEN {
            sim.tick().unwrap();
        }
        sim.reset();
        assert_eq!(sim.state().generation(), 1);
        assert_eq!(sim.state().tick_index(), 0);
        assert!(sim.state().historical_draws().is_empty());
        assert!(sim.history().is_empty());
        assert_eq!(sim.run_state(), RunState::Idle);
        assert_eq!(sim.state().population().len(), 3);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut sim = running();
        for _ in 0..5 {
            sim.tick().unwrap();
        }
        let snapshot = sim.save().unwrap();
        let json = snapshot.to_json().unwrap();
        let saved_weights = sim.best_agent().unwrap().model().weights();

        let mut other = simulation_with(SimulationConfig {
            seed: Some(99),
            ..config()
        });
        other.load(&json).unwrap();
        assert_eq!(other.state().generation(), sim.state().generation());
        assert_eq!(other.state().tick_index(), 5);
        assert_eq!(other.state().historical_draws(), sim.state().historical_draws());
        for agent in other.state().population().agents() {
            assert_eq!(agent.model().weights(), saved_weights);
        }
    }

    #[test]
    fn test_load_failures_leave_state_untouched() {
        let mut sim = running();
        sim.tick().unwrap();
        let before = sim.state().population().agents()[0].model().weights();

        let err = sim.load(r#"{"generation": 4, "tickIndex": 2}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingModel));

        let mut wider = simulation_with(SimulationConfig {
            window_len: 4,
            ..config()
        });
        wider.start();
        let json = wider.save().unwrap().to_json().unwrap();
        let err = sim.load(&json).unwrap_err();
        assert!(matches!(err, SnapshotError::ShapeMismatch(_)));

        assert!(matches!(sim.load("[1, 2"), Err(SnapshotError::Deserialization(_))));

        assert_eq!(sim.state().generation(), 1);
        assert_eq!(sim.state().tick_index(), 1);
        assert_eq!(sim.state().population().agents()[0].model().weights(), before);
    }

    #[test]
    fn test_load_rejects_unusable_learning_rate() {
        let mut sim = running();
        sim.tick().unwrap();
        let before = sim.state().population().agents()[0].model().weights();

        let mut snapshot = sim.save().unwrap();
        let architecture = snapshot.model_architecture.unwrap();
        let layout = architecture.layout().with_learning_rate(-5.0);
        snapshot.model_architecture = Some(ModelArchitecture::new(architecture.kind(), layout));
        snapshot.generation = Some(7);

        let err = sim.load(&snapshot.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidField { field: "modelArchitecture", .. }));
        assert_eq!(sim.state().generation(), 1);
        assert_eq!(sim.state().population().agents()[0].model().weights(), before);
    }

    #[test]
    fn test_partial_snapshot_keeps_counters() {
        let mut sim = running();
        for _ in 0..2 {
            sim.tick().unwrap();
        }
        let mut snapshot = sim.save().unwrap();
        snapshot.generation = None;
        snapshot.tick_index = None;
        snapshot.historical_draws = None;

        let mut other = running();
        for _ in 0..4 {
            other.tick().unwrap();
        }
        other.restore(&snapshot).unwrap();
        assert_eq!(other.state().tick_index(), 4);
        assert_eq!(other.state().historical_draws().len(), 4);
    }

    #[test]
    fn test_telemetry_sink_receives_one_payload_per_agent() {
        let mut sim = running();
        let (tx, rx) = mpsc::channel();
        sim.set_telemetry_sink(Some(Box::new(tx)));
        sim.tick().unwrap();
        let payloads = rx.try_iter().collect::<Vec<_>>();
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0].output.len(), DRAW_SIZE);
        assert_eq!(payloads[0].input.len(), 3 * 32);
        assert!(!payloads[0].weights.is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = running();
        let mut b = running();
        for _ in 0..3 {
            let ra = a.tick().unwrap();
            let rb = b.tick().unwrap();
            assert_eq!(ra.outcomes, rb.outcomes);
        }
    }

    #[test]
    fn test_strict_policy_is_default() {
        let sim = simulation_with(config());
        let board = sample_feed(1).draws()[0].numbers().clone();
        assert!((Strict.reward(11, &[], &board) - 1.0).abs() < f64::EPSILON);
        assert_eq!(sim.config().reward, RewardKind::Strict);
    }
}
