//! Trainable sequence models for draw prediction.
//!
//! Every model family implements the [`Model`] capability trait. The simulation
//! engine only ever talks to `dyn Model`, so families are interchangeable: an
//! agent can be backed by a [`dense::DenseNetwork`] or a
//! [`recurrent::RecurrentNetwork`] without the engine knowing which.
//!
//! # Capabilities
//!
//! - **Inference** - [`Model::predict`] maps a [`FeatureWindow`] to one raw score per output slot
//! - **Online training** - [`Model::fit_step`] runs one optimizer step against a target vector
//! - **Batch training** - [`Model::fit_batch`] steps on the mean gradient of a mini-batch, and
//!   [`pretrain::pretrain`] runs epochs with a validation split and early stopping
//! - **Weights** - [`Model::weights`] / [`Model::set_weights`] expose parameters as numeric arrays
//! - **Persistence** - [`Model::snapshot`] / [`ModelSnapshot::restore`] round-trip architecture and
//!   weights
//! - **Cloning** - [`Model::clone_boxed`] produces an independent deep copy
//!
//! # Architecture
//!
//! ```text
//! FeatureWindow (steps × features)
//!     ↓ predict
//! DenseNetwork | RecurrentNetwork
//!     ↓ sigmoid
//! raw scores in [0, 1], one per output slot
//! ```
//!
//! Both families are trained with binary cross-entropy and Adam. A training
//! step is atomic: shapes are validated first, the update is computed into
//! scratch buffers, and the weights are replaced only if every value is
//! finite.
//!
//! # Example
//!
//! ```
//! use lotofacil_model::{FeatureWindow, Model as _, ModelArchitecture, NetworkLayout};
//! use rand::SeedableRng as _;
//!
//! let layout = NetworkLayout::new(3, 4, 8, 2);
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
//! let mut model = ModelArchitecture::Recurrent(layout).build_random(&mut rng);
//!
//! let input = FeatureWindow::zeros(3, 4);
//! let before = model.predict(&input).unwrap();
//! assert_eq!(before.len(), 2);
//!
//! model.fit_step(&input, &[1.0, 0.0]).unwrap();
//! let restored = model.snapshot().restore().unwrap();
//! assert_eq!(restored.weights(), model.weights());
//! ```

use std::fmt;

pub use self::{
    architecture::{LayoutError, ModelArchitecture, ModelKind, ModelSnapshot, NetworkLayout},
    pretrain::TrainingSample,
};

pub mod architecture;
pub mod dense;
pub mod init;
mod math;
pub mod optimizer;
mod params;
pub mod pretrain;
pub mod recurrent;

/// A tensor count or length does not match what the architecture requires.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("shape mismatch in {context}: expected {expected}, found {found}")]
pub struct ShapeMismatchError {
    pub context: String,
    pub expected: usize,
    pub found: usize,
}

impl ShapeMismatchError {
    /// Returns an error naming `context` unless `expected == found`.
    pub fn check(context: impl fmt::Display, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self {
                context: context.to_string(),
                expected,
                found,
            })
        }
    }
}

/// A training step was rejected. The model keeps its previous weights.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("{_0}")]
    #[from]
    Shape(ShapeMismatchError),
    #[display("training step produced non-finite {what}")]
    NonFinite { what: &'static str },
    #[display("training batch is empty")]
    EmptyBatch,
}

/// Stacked per-step feature vectors fed to a model.
///
/// Values are stored row-major: step `t` occupies
/// `values[t * width..(t + 1) * width]`. Step 0 is the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    steps: usize,
    width: usize,
    values: Vec<f32>,
}

impl FeatureWindow {
    /// Wraps `values` as a `steps × width` window.
    pub fn new(steps: usize, width: usize, values: Vec<f32>) -> Result<Self, ShapeMismatchError> {
        ShapeMismatchError::check("feature window values", steps * width, values.len())?;
        Ok(Self {
            steps,
            width,
            values,
        })
    }

    /// Creates an all-zero window.
    #[must_use]
    pub fn zeros(steps: usize, width: usize) -> Self {
        Self {
            steps,
            width,
            values: vec![0.0; steps * width],
        }
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns all values, flattened oldest step first.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the feature vector of step `t`.
    #[must_use]
    pub fn step(&self, t: usize) -> &[f32] {
        &self.values[t * self.width..(t + 1) * self.width]
    }

    /// Returns a mutable view of the feature vector of step `t`.
    pub fn step_mut(&mut self, t: usize) -> &mut [f32] {
        &mut self.values[t * self.width..(t + 1) * self.width]
    }
}

/// Capability contract shared by every trainable model family.
pub trait Model: fmt::Debug + Send + Sync {
    /// Returns the architecture needed to rebuild this model.
    fn architecture(&self) -> ModelArchitecture;

    /// Runs inference and returns one score in `[0, 1]` per output slot.
    fn predict(&self, input: &FeatureWindow) -> Result<Vec<f32>, ShapeMismatchError>;

    /// Runs one optimizer step against `target` and returns the loss before the update.
    ///
    /// On error the weights are left untouched.
    fn fit_step(&mut self, input: &FeatureWindow, target: &[f32]) -> Result<f32, TrainingError>;

    /// Runs one optimizer step on the whole batch and returns its mean loss
    /// before the update.
    ///
    /// The provided implementation steps once per sample and only keeps the
    /// steps that succeeded before an error. Families with direct access to
    /// their gradients override it with a single atomic step on the mean
    /// gradient.
    fn fit_batch(&mut self, batch: &[&TrainingSample]) -> Result<f32, TrainingError> {
        if batch.is_empty() {
            return Err(TrainingError::EmptyBatch);
        }
        let mut total = 0.0;
        for sample in batch {
            total += self.fit_step(&sample.input, &sample.target)?;
        }
        #[expect(clippy::cast_precision_loss)]
        let mean = total / batch.len() as f32;
        Ok(mean)
    }

    /// Returns a copy of every parameter tensor, in architecture order.
    fn weights(&self) -> Vec<Vec<f32>>;

    /// Replaces every parameter tensor. Lengths must match the architecture.
    fn set_weights(&mut self, weights: &[Vec<f32>]) -> Result<(), ShapeMismatchError>;

    /// Returns an independent deep copy.
    fn clone_boxed(&self) -> BoxedModel;

    /// Captures architecture and weights for persistence.
    fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            architecture: self.architecture(),
            weights: self.weights(),
        }
    }
}

pub type BoxedModel = Box<dyn Model>;

impl Clone for BoxedModel {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}
