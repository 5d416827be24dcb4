//! Adam optimizer with all-or-nothing updates.

use crate::{FeatureWindow, ShapeMismatchError, TrainingError, TrainingSample, params::Parameters};

/// Gradients are clamped element-wise to this magnitude before the update.
pub const GRADIENT_CLIP: f32 = 5.0;

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-7;

/// Adam moment estimates for one parameter set.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    step: i32,
    first_moment: Parameters,
    second_moment: Parameters,
}

impl Adam {
    pub(crate) fn new(learning_rate: f32, params: &Parameters) -> Self {
        Self {
            learning_rate,
            step: 0,
            first_moment: params.zeros_like(),
            second_moment: params.zeros_like(),
        }
    }

    fn apply(&mut self, params: &mut Parameters, grads: &Parameters) {
        self.step = self.step.saturating_add(1);
        let bias1 = 1.0 - BETA1.powi(self.step);
        let bias2 = 1.0 - BETA2.powi(self.step);
        let lr = self.learning_rate;

        let tensors = params
            .tensors_mut()
            .iter_mut()
            .zip(grads.tensors())
            .zip(self.first_moment.tensors_mut().iter_mut())
            .zip(self.second_moment.tensors_mut().iter_mut());
        for (((p, g), m), v) in tensors {
            for (((p, &g), m), v) in p.iter_mut().zip(g).zip(m.iter_mut()).zip(v.iter_mut()) {
                *m = BETA1 * *m + (1.0 - BETA1) * g;
                *v = BETA2 * *v + (1.0 - BETA2) * g * g;
                *p -= lr * (*m / bias1) / ((*v / bias2).sqrt() + EPSILON);
            }
        }
    }

    /// Applies one update to `params`, committing it only if everything stays finite.
    ///
    /// The update runs on scratch copies of the parameters and moments; on
    /// error both `params` and `self` are unchanged.
    pub(crate) fn step_atomic(
        &mut self,
        params: &mut Parameters,
        mut grads: Parameters,
        loss: f32,
    ) -> Result<f32, TrainingError> {
        if !loss.is_finite() {
            return Err(TrainingError::NonFinite { what: "loss" });
        }
        if !grads.all_finite() {
            return Err(TrainingError::NonFinite { what: "gradients" });
        }
        grads.clamp(GRADIENT_CLIP);

        let mut next_params = params.clone();
        let mut next_optimizer = self.clone();
        next_optimizer.apply(&mut next_params, &grads);
        if !next_params.all_finite() {
            return Err(TrainingError::NonFinite { what: "weights" });
        }

        *params = next_params;
        *self = next_optimizer;
        Ok(loss)
    }
}

/// Averages per-sample gradients and losses over `batch`.
///
/// Fails on the first sample whose shapes do not fit.
pub(crate) fn mean_gradients<F>(
    batch: &[&TrainingSample],
    mut gradients: F,
) -> Result<(Parameters, f32), TrainingError>
where
    F: FnMut(&FeatureWindow, &[f32]) -> Result<(Parameters, f32), ShapeMismatchError>,
{
    let Some((first, rest)) = batch.split_first() else {
        return Err(TrainingError::EmptyBatch);
    };
    let (mut sum, mut loss) = gradients(&first.input, &first.target)?;
    for sample in rest {
        let (grads, sample_loss) = gradients(&sample.input, &sample.target)?;
        sum.accumulate(&grads);
        loss += sample_loss;
    }
    #[expect(clippy::cast_precision_loss)]
    let scale = 1.0 / batch.len() as f32;
    sum.scale(scale);
    Ok((sum, loss * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_against_gradient() {
        let mut params = Parameters::new(vec![vec![1.0, -1.0]]);
        let mut adam = Adam::new(0.1, &params);
        let grads = Parameters::new(vec![vec![0.5, -0.5]]);
        adam.step_atomic(&mut params, grads, 1.0).unwrap();
        // bias-corrected first step is lr * sign(g)
        assert!((params.tensor(0)[0] - 0.9).abs() < 1e-4);
        assert!((params.tensor(0)[1] + 0.9).abs() < 1e-4);
        assert_eq!(adam.step, 1);
    }

    #[test]
    fn test_non_finite_gradient_leaves_state_untouched() {
        let mut params = Parameters::new(vec![vec![1.0]]);
        let mut adam = Adam::new(0.1, &params);
        let grads = Parameters::new(vec![vec![f32::NAN]]);
        let err = adam.step_atomic(&mut params, grads, 1.0).unwrap_err();
        assert_eq!(err, TrainingError::NonFinite { what: "gradients" });
        assert_eq!(params.tensor(0), &[1.0]);
        assert_eq!(adam.step, 0);
    }

    #[test]
    fn test_non_finite_loss_rejected() {
        let mut params = Parameters::new(vec![vec![1.0]]);
        let mut adam = Adam::new(0.1, &params);
        let grads = params.zeros_like();
        assert!(adam.step_atomic(&mut params, grads, f32::INFINITY).is_err());
    }

    #[test]
    fn test_mean_gradients() {
        let samples = [
            TrainingSample::new(FeatureWindow::zeros(1, 1), vec![1.0]),
            TrainingSample::new(FeatureWindow::zeros(1, 1), vec![3.0]),
        ];
        let batch = samples.iter().collect::<Vec<_>>();
        let (grads, loss) = mean_gradients(&batch, |_, target| {
            Ok((Parameters::new(vec![vec![target[0]; 2]]), target[0] * 2.0))
        })
        .unwrap();
        assert_eq!(grads.tensor(0), &[2.0, 2.0]);
        assert!((loss - 4.0).abs() < f32::EPSILON);
        let err = mean_gradients(&[], |_, _| unreachable!()).unwrap_err();
        assert_eq!(err, TrainingError::EmptyBatch);
    }
}
