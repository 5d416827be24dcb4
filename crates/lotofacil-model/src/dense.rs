//! Feed-forward network over the flattened feature window.
//!
//! One ReLU hidden layer followed by a sigmoid output layer.

use rand::Rng;

use crate::{
    BoxedModel, FeatureWindow, Model, ModelArchitecture, NetworkLayout, ShapeMismatchError,
    TrainingError, TrainingSample, init, math,
    optimizer::{self, Adam},
    params::Parameters,
};

const HIDDEN_WEIGHTS: usize = 0;
const HIDDEN_BIAS: usize = 1;
const OUTPUT_WEIGHTS: usize = 2;
const OUTPUT_BIAS: usize = 3;

#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layout: NetworkLayout,
    params: Parameters,
    optimizer: Adam,
}

struct Forward {
    hidden: Vec<f32>,
    output: Vec<f32>,
}

impl DenseNetwork {
    /// Tensor lengths in weight order: hidden kernel, hidden bias, output kernel, output bias.
    #[must_use]
    pub fn tensor_lengths(layout: &NetworkLayout) -> [usize; 4] {
        [
            layout.hidden * layout.input_len(),
            layout.hidden,
            layout.outputs * layout.hidden,
            layout.outputs,
        ]
    }

    pub fn random<R>(layout: NetworkLayout, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let params = Parameters::new(vec![
            init::glorot_uniform(rng, layout.input_len(), layout.hidden),
            init::zeros(layout.hidden),
            init::glorot_uniform(rng, layout.hidden, layout.outputs),
            init::zeros(layout.outputs),
        ]);
        Self::from_params(layout, params)
    }

    pub fn with_weights(
        layout: NetworkLayout,
        weights: Vec<Vec<f32>>,
    ) -> Result<Self, ShapeMismatchError> {
        let params = Parameters::with_lengths(&Self::tensor_lengths(&layout), weights)?;
        Ok(Self::from_params(layout, params))
    }

    fn from_params(layout: NetworkLayout, params: Parameters) -> Self {
        let optimizer = Adam::new(layout.learning_rate, &params);
        Self {
            layout,
            params,
            optimizer,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &NetworkLayout {
        &self.layout
    }

    fn check_input(&self, input: &FeatureWindow) -> Result<(), ShapeMismatchError> {
        ShapeMismatchError::check("window steps", self.layout.steps, input.steps())?;
        ShapeMismatchError::check("features per step", self.layout.features, input.width())
    }

    fn forward(&self, input: &FeatureWindow) -> Forward {
        let p = &self.params;
        let mut hidden = math::affine(
            p.tensor(HIDDEN_WEIGHTS),
            p.tensor(HIDDEN_BIAS),
            input.values(),
        );
        for h in &mut hidden {
            *h = h.max(0.0);
        }
        let mut output = math::affine(p.tensor(OUTPUT_WEIGHTS), p.tensor(OUTPUT_BIAS), &hidden);
        for o in &mut output {
            *o = math::sigmoid(*o);
        }
        Forward { hidden, output }
    }

    /// Returns the loss gradients for one sample, and the loss itself.
    fn gradients(
        &self,
        input: &FeatureWindow,
        target: &[f32],
    ) -> Result<(Parameters, f32), ShapeMismatchError> {
        self.check_input(input)?;
        ShapeMismatchError::check("target length", self.layout.outputs, target.len())?;

        let Forward { hidden, output } = self.forward(input);
        let loss = math::binary_cross_entropy(&output, target);

        let mut grads = self.params.zeros_like();
        let d_out = math::bce_sigmoid_delta(&output, target);
        math::add_outer(grads.tensor_mut(OUTPUT_WEIGHTS), &d_out, &hidden);
        grads.tensor_mut(OUTPUT_BIAS).copy_from_slice(&d_out);

        let mut d_hidden = math::transpose_mul(self.params.tensor(OUTPUT_WEIGHTS), &d_out);
        for (d, &h) in d_hidden.iter_mut().zip(&hidden) {
            if h <= 0.0 {
                *d = 0.0;
            }
        }
        math::add_outer(grads.tensor_mut(HIDDEN_WEIGHTS), &d_hidden, input.values());
        grads.tensor_mut(HIDDEN_BIAS).copy_from_slice(&d_hidden);

        Ok((grads, loss))
    }
}

impl Model for DenseNetwork {
    fn architecture(&self) -> ModelArchitecture {
        ModelArchitecture::Dense(self.layout)
    }

    fn predict(&self, input: &FeatureWindow) -> Result<Vec<f32>, ShapeMismatchError> {
        self.check_input(input)?;
        Ok(self.forward(input).output)
    }

    fn fit_step(&mut self, input: &FeatureWindow, target: &[f32]) -> Result<f32, TrainingError> {
        let (grads, loss) = self.gradients(input, target)?;
        self.optimizer.step_atomic(&mut self.params, grads, loss)
    }

    fn fit_batch(&mut self, batch: &[&TrainingSample]) -> Result<f32, TrainingError> {
        let (grads, loss) = optimizer::mean_gradients(batch, |input, target| {
            self.gradients(input, target)
        })?;
        self.optimizer.step_atomic(&mut self.params, grads, loss)
    }

    fn weights(&self) -> Vec<Vec<f32>> {
        self.params.tensors().to_vec()
    }

    fn set_weights(&mut self, weights: &[Vec<f32>]) -> Result<(), ShapeMismatchError> {
        self.params.assign(weights)?;
        self.optimizer = Adam::new(self.layout.learning_rate, &self.params);
        Ok(())
    }

    fn clone_boxed(&self) -> BoxedModel {
        Box::new(self.clone())
    }
}
