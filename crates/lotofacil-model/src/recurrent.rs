//! Elman recurrent network.
//!
//! The window is consumed one step at a time, oldest first:
//!
//! ```text
//! h_0 = 0
//! h_t = tanh(W_x · x_t + W_h · h_{t-1} + b_h)
//! y   = sigmoid(W_o · h_T + b_o)
//! ```
//!
//! Gradients are computed with backpropagation through time over the whole
//! window.

use rand::Rng;

use crate::{
    BoxedModel, FeatureWindow, Model, ModelArchitecture, NetworkLayout, ShapeMismatchError,
    TrainingError, TrainingSample, init, math,
    optimizer::{self, Adam},
    params::Parameters,
};

const INPUT_WEIGHTS: usize = 0;
const RECURRENT_WEIGHTS: usize = 1;
const HIDDEN_BIAS: usize = 2;
const OUTPUT_WEIGHTS: usize = 3;
const OUTPUT_BIAS: usize = 4;

/// Recurrent kernel entries are drawn from `N(0, (RECURRENT_GAIN / sqrt(hidden))²)`.
const RECURRENT_GAIN: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct RecurrentNetwork {
    layout: NetworkLayout,
    params: Parameters,
    optimizer: Adam,
}

impl RecurrentNetwork {
    /// Tensor lengths in weight order: input kernel, recurrent kernel, hidden
    /// bias, output kernel, output bias.
    #[must_use]
    pub fn tensor_lengths(layout: &NetworkLayout) -> [usize; 5] {
        [
            layout.hidden * layout.features,
            layout.hidden * layout.hidden,
            layout.hidden,
            layout.outputs * layout.hidden,
            layout.outputs,
        ]
    }

    pub fn random<R>(layout: NetworkLayout, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        #[expect(clippy::cast_precision_loss)]
        let recurrent_std = RECURRENT_GAIN / (layout.hidden.max(1) as f32).sqrt();
        let params = Parameters::new(vec![
            init::glorot_uniform(rng, layout.features, layout.hidden),
            init::scaled_normal(rng, recurrent_std, layout.hidden * layout.hidden),
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

    /// Returns hidden states `h_0..=h_T` (with `h_0` all zeros) and the output.
    fn forward(&self, input: &FeatureWindow) -> (Vec<Vec<f32>>, Vec<f32>) {
        let p = &self.params;
        let mut states = Vec::with_capacity(input.steps() + 1);
        states.push(vec![0.0; self.layout.hidden]);
        for t in 0..input.steps() {
            let mut h = math::affine(
                p.tensor(INPUT_WEIGHTS),
                p.tensor(HIDDEN_BIAS),
                input.step(t),
            );
            math::accumulate_mul(p.tensor(RECURRENT_WEIGHTS), &states[t], &mut h);
            for v in &mut h {
                *v = v.tanh();
            }
            states.push(h);
        }
        let last = &states[states.len() - 1];
        let mut output = math::affine(p.tensor(OUTPUT_WEIGHTS), p.tensor(OUTPUT_BIAS), last);
        for o in &mut output {
            *o = math::sigmoid(*o);
        }
        (states, output)
    }

    /// Backpropagates one sample through time. Returns the gradients and the loss.
    fn gradients(
        &self,
        input: &FeatureWindow,
        target: &[f32],
    ) -> Result<(Parameters, f32), ShapeMismatchError> {
        self.check_input(input)?;
        ShapeMismatchError::check("target length", self.layout.outputs, target.len())?;

        let (states, output) = self.forward(input);
        let loss = math::binary_cross_entropy(&output, target);

        let mut grads = self.params.zeros_like();
        let d_out = math::bce_sigmoid_delta(&output, target);
        math::add_outer(grads.tensor_mut(OUTPUT_WEIGHTS), &d_out, &states[input.steps()]);
        grads.tensor_mut(OUTPUT_BIAS).copy_from_slice(&d_out);

        let mut d_h = math::transpose_mul(self.params.tensor(OUTPUT_WEIGHTS), &d_out);
        for t in (0..input.steps()).rev() {
            let h = &states[t + 1];
            let d_a = d_h.iter().zip(h).map(|(d, h)| d * (1.0 - h * h)).collect::<Vec<_>>();
            math::add_outer(grads.tensor_mut(INPUT_WEIGHTS), &d_a, input.step(t));
            math::add_outer(grads.tensor_mut(RECURRENT_WEIGHTS), &d_a, &states[t]);
            for (g, d) in grads.tensor_mut(HIDDEN_BIAS).iter_mut().zip(&d_a) {
                *g += d;
            }
            d_h = math::transpose_mul(self.params.tensor(RECURRENT_WEIGHTS), &d_a);
        }

        Ok((grads, loss))
    }
}

impl Model for RecurrentNetwork {
    fn architecture(&self) -> ModelArchitecture {
        ModelArchitecture::Recurrent(self.layout)
    }

    fn predict(&self, input: &FeatureWindow) -> Result<Vec<f32>, ShapeMismatchError> {
        self.check_input(input)?;
        Ok(self.forward(input).1)
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
