//! Offline pre-training of one model over a whole draw feed.
//!
//! Sample `i` pairs the input window built from draws `0..=i - 1` with the
//! target vector of draw `i`, exactly as the tick loop would see them. The
//! resulting model can seed a population through
//! [`Simulation::with_initial_model`](crate::Simulation::with_initial_model).

use chrono::{DateTime, Utc};
use lotofacil_model::{
    BoxedModel, TrainingSample,
    pretrain::{self, PretrainConfig, PretrainReport},
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::{debug, info};

use crate::{
    SimulationError,
    config::SimulationConfig,
    draw::{Draw, DrawFeed},
    features::Clock,
    statistics::Statistics,
    trainer,
};

/// Builds one sample per draw that has at least one predecessor.
#[must_use]
pub fn training_samples(
    config: &SimulationConfig,
    draws: &[Draw],
    now: DateTime<Utc>,
) -> Vec<TrainingSample> {
    let layout = config.feature_layout();
    let stats = Statistics::update(draws, config.hot_count, config.moving_average_window);
    (1..draws.len())
        .map(|i| {
            let input =
                layout.build_window(&draws[..i], stats.moving_average(), i, draws.len(), now);
            TrainingSample::new(input, trainer::target_vector(draws[i].numbers()))
        })
        .collect()
}

/// Trains a fresh model of the configured architecture on `feed`.
///
/// The returned model carries the weights of the best epoch.
pub fn pretrain_model(
    config: &SimulationConfig,
    feed: &DrawFeed,
    pretrain: &PretrainConfig,
    clock: &dyn Clock,
) -> Result<(BoxedModel, PretrainReport), SimulationError> {
    config.validate()?;
    if feed.is_empty() {
        return Err(SimulationError::EmptyFeed);
    }
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut model = config.model_architecture().build_random(&mut rng);
    let samples = training_samples(config, feed.draws(), clock.now());
    info!(
        seed,
        samples = samples.len(),
        model = %config.model,
        epochs = pretrain.epochs,
        batch_size = pretrain.batch_size,
        "pre-training started"
    );

    let report = pretrain::pretrain(model.as_mut(), &samples, pretrain, &mut rng, |record| {
        debug!(
            epoch = record.epoch,
            loss = record.loss,
            val_loss = record.val_loss,
            "epoch finished"
        );
    })?;
    info!(
        epochs = report.history.len(),
        best_epoch = report.best_epoch,
        stopped_early = report.stopped_early,
        "pre-training finished"
    );
    Ok((model, report))
}
