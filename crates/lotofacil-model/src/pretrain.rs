//! Offline mini-batch training with a validation split and early stopping.
//!
//! The last `validation_split` fraction of the samples is held out. Each
//! epoch shuffles the remaining samples, steps once per mini-batch and then
//! scores the held-out samples. Training stops once the monitored loss has not
//! improved for `patience` epochs, and the model is left with the weights of
//! its best epoch.

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::{FeatureWindow, Model, ShapeMismatchError, TrainingError, math};

/// One input window and the target vector the model should produce for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub input: FeatureWindow,
    pub target: Vec<f32>,
}

impl TrainingSample {
    #[must_use]
    pub fn new(input: FeatureWindow, target: Vec<f32>) -> Self {
        Self { input, target }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PretrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of samples, taken from the end, held out for validation.
    pub validation_split: f32,
    /// Epochs without improvement before training stops.
    pub patience: usize,
}

impl Default for PretrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            validation_split: 0.2,
            patience: 10,
        }
    }
}

/// Losses of one finished epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochRecord {
    /// 1-based.
    pub epoch: usize,
    /// Mean training loss over the epoch's mini-batches.
    pub loss: f32,
    /// Mean loss over the held-out samples, if any were held out.
    pub val_loss: Option<f32>,
}

impl EpochRecord {
    /// The loss early stopping watches.
    #[must_use]
    pub fn monitored(&self) -> f32 {
        self.val_loss.unwrap_or(self.loss)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PretrainReport {
    pub history: Vec<EpochRecord>,
    /// Epoch whose weights the model was left with.
    pub best_epoch: usize,
    pub stopped_early: bool,
}

impl PretrainReport {
    #[must_use]
    pub fn best(&self) -> Option<&EpochRecord> {
        self.history.iter().find(|record| record.epoch == self.best_epoch)
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PretrainError {
    #[display("no training samples")]
    NoSamples,
    #[display("validation split must be in [0, 1), got {value}")]
    ValidationSplit { value: f32 },
    #[display("batch size must be at least 1")]
    BatchSize,
    #[display("epoch count must be at least 1")]
    NoEpochs,
    #[display("training failed in epoch {epoch}: {source}")]
    Training { epoch: usize, source: TrainingError },
    #[display("{_0}")]
    #[from]
    Shape(ShapeMismatchError),
}

impl PretrainConfig {
    pub fn validate(&self) -> Result<(), PretrainError> {
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PretrainError::ValidationSplit {
                value: self.validation_split,
            });
        }
        if self.batch_size == 0 {
            return Err(PretrainError::BatchSize);
        }
        if self.epochs == 0 {
            return Err(PretrainError::NoEpochs);
        }
        Ok(())
    }

    /// Number of samples held out from `len`. At least one sample is always trained on.
    #[must_use]
    pub fn validation_len(&self, len: usize) -> usize {
        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let held_out = (len as f32 * self.validation_split).floor() as usize;
        held_out.min(len.saturating_sub(1))
    }
}

/// Trains `model` on `samples` and leaves it with the weights of the best epoch.
///
/// `on_epoch` is called after every epoch. Every sample is shape-checked before
/// the first step, so a bad sample fails without touching the model.
pub fn pretrain<R, F>(
    model: &mut dyn Model,
    samples: &[TrainingSample],
    config: &PretrainConfig,
    rng: &mut R,
    mut on_epoch: F,
) -> Result<PretrainReport, PretrainError>
where
    R: Rng + ?Sized,
    F: FnMut(&EpochRecord),
{
    config.validate()?;
    if samples.is_empty() {
        return Err(PretrainError::NoSamples);
    }
    let outputs = model.architecture().layout().outputs;
    for sample in samples {
        model.predict(&sample.input)?;
        ShapeMismatchError::check("target length", outputs, sample.target.len())?;
    }

    let train_len = samples.len() - config.validation_len(samples.len());
    let (train, validation) = samples.split_at(train_len);
    let mut order = (0..train.len()).collect::<Vec<_>>();
    let mut best = (f32::INFINITY, 0, model.weights());
    let mut history = Vec::new();
    let mut stopped_early = false;

    for epoch in 1..=config.epochs {
        order.shuffle(rng);
        let mut loss_sum = 0.0;
        for chunk in order.chunks(config.batch_size) {
            let batch = chunk.iter().map(|&i| &train[i]).collect::<Vec<_>>();
            loss_sum += model
                .fit_batch(&batch)
                .map_err(|source| PretrainError::Training { epoch, source })?;
        }
        #[expect(clippy::cast_precision_loss)]
        let batches = train.len().div_ceil(config.batch_size) as f32;
        let record = EpochRecord {
            epoch,
            loss: loss_sum / batches,
            val_loss: mean_loss(model, validation)?,
        };
        on_epoch(&record);
        history.push(record);

        if record.monitored() < best.0 {
            best = (record.monitored(), epoch, model.weights());
        } else if epoch - best.1 >= config.patience {
            stopped_early = epoch < config.epochs;
            break;
        }
    }

    // epoch 0 stands for the initial weights
    let (_, best_epoch, weights) = best;
    model.set_weights(&weights)?;
    Ok(PretrainReport {
        history,
        best_epoch,
        stopped_early,
    })
}

/// Mean loss of `model` over `samples`, or `None` when there are none.
fn mean_loss(model: &dyn Model, samples: &[TrainingSample]) -> Result<Option<f32>, PretrainError> {
    if samples.is_empty() {
        return Ok(None);
    }
    let mut total = 0.0;
    for sample in samples {
        let output = model.predict(&sample.input)?;
        total += math::binary_cross_entropy(&output, &sample.target);
    }
    #[expect(clippy::cast_precision_loss)]
    let mean = total / samples.len() as f32;
    Ok(Some(mean))
}
