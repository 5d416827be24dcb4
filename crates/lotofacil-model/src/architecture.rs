//! Serializable model architecture descriptions.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{BoxedModel, ShapeMismatchError, dense::DenseNetwork, recurrent::RecurrentNetwork};

const DEFAULT_LEARNING_RATE: f32 = 0.001;

fn default_learning_rate() -> f32 {
    DEFAULT_LEARNING_RATE
}

/// Dimensions shared by every model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkLayout {
    /// Number of time steps in the input window.
    pub steps: usize,
    /// Features per time step.
    pub features: usize,
    pub hidden: usize,
    pub outputs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
}

impl NetworkLayout {
    #[must_use]
    pub fn new(steps: usize, features: usize, hidden: usize, outputs: usize) -> Self {
        Self {
            steps,
            features,
            hidden,
            outputs,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    #[must_use]
    pub fn with_learning_rate(self, learning_rate: f32) -> Self {
        Self {
            learning_rate,
            ..self
        }
    }

    /// Length of a flattened input window.
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.steps * self.features
    }

    /// Checks that every dimension is positive and the learning rate is usable.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let dimensions = [
            ("steps", self.steps),
            ("features", self.features),
            ("hidden", self.hidden),
            ("outputs", self.outputs),
        ];
        if let Some(&(dimension, _)) = dimensions.iter().find(|(_, value)| *value == 0) {
            return Err(LayoutError::ZeroDimension { dimension });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(LayoutError::LearningRate {
                value: self.learning_rate,
            });
        }
        Ok(())
    }
}

/// A layout that no model can be built from.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum LayoutError {
    #[display("{dimension} must be at least 1")]
    ZeroDimension { dimension: &'static str },
    #[display("learning rate must be positive and finite, got {value}")]
    LearningRate { value: f32 },
}

/// Model family selector.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[display("dense")]
    Dense,
    #[default]
    #[display("recurrent")]
    Recurrent,
}

/// Model family plus layout: everything needed to rebuild a model from weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArchitecture {
    Dense(NetworkLayout),
    Recurrent(NetworkLayout),
}

impl ModelArchitecture {
    #[must_use]
    pub fn new(kind: ModelKind, layout: NetworkLayout) -> Self {
        match kind {
            ModelKind::Dense => Self::Dense(layout),
            ModelKind::Recurrent => Self::Recurrent(layout),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Dense(_) => ModelKind::Dense,
            Self::Recurrent(_) => ModelKind::Recurrent,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &NetworkLayout {
        match self {
            Self::Dense(layout) | Self::Recurrent(layout) => layout,
        }
    }

    /// Lengths of every parameter tensor, in weight order.
    #[must_use]
    pub fn tensor_lengths(&self) -> Vec<usize> {
        match self {
            Self::Dense(layout) => DenseNetwork::tensor_lengths(layout).to_vec(),
            Self::Recurrent(layout) => RecurrentNetwork::tensor_lengths(layout).to_vec(),
        }
    }

    /// Builds a freshly initialized model.
    pub fn build_random<R>(&self, rng: &mut R) -> BoxedModel
    where
        R: Rng + ?Sized,
    {
        match *self {
            Self::Dense(layout) => Box::new(DenseNetwork::random(layout, rng)),
            Self::Recurrent(layout) => Box::new(RecurrentNetwork::random(layout, rng)),
        }
    }

    /// Builds a model from stored weights.
    pub fn build_with_weights(
        &self,
        weights: Vec<Vec<f32>>,
    ) -> Result<BoxedModel, ShapeMismatchError> {
        Ok(match *self {
            Self::Dense(layout) => Box::new(DenseNetwork::with_weights(layout, weights)?),
            Self::Recurrent(layout) => Box::new(RecurrentNetwork::with_weights(layout, weights)?),
        })
    }
}

/// Architecture and weights of one model, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub architecture: ModelArchitecture,
    pub weights: Vec<Vec<f32>>,
}

impl ModelSnapshot {
    /// Rebuilds the model. Fails if the weights do not fit the architecture.
    pub fn restore(&self) -> Result<BoxedModel, ShapeMismatchError> {
        self.architecture.build_with_weights(self.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_architecture_json_shape() {
        let arch = ModelArchitecture::Dense(NetworkLayout::new(2, 3, 4, 5));
        let json = serde_json::to_value(arch).unwrap();
        assert_eq!(json["kind"], "dense");
        assert_eq!(json["steps"], 2);
        assert_eq!(json["outputs"], 5);
    }

    #[test]
    fn test_learning_rate_defaults_when_missing() {
        let json = r#"{"kind":"recurrent","steps":1,"features":2,"hidden":3,"outputs":4}"#;
        let arch: ModelArchitecture = serde_json::from_str(json).unwrap();
        assert_eq!(arch.kind(), ModelKind::Recurrent);
        assert!((arch.layout().learning_rate - DEFAULT_LEARNING_RATE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!("dense".parse::<ModelKind>().unwrap(), ModelKind::Dense);
        assert_eq!("Recurrent".parse::<ModelKind>().unwrap(), ModelKind::Recurrent);
        assert!("lstm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_restore_rejects_short_weights() {
        let arch = ModelArchitecture::Dense(NetworkLayout::new(2, 3, 4, 5));
        let mut weights = arch.build_random(&mut Pcg32::seed_from_u64(1)).weights();
        weights[0].pop();
        let snapshot = ModelSnapshot {
            architecture: arch,
            weights,
        };
        assert!(snapshot.restore().is_err());
    }

    #[test]
    fn test_layout_validation() {
        assert!(NetworkLayout::new(1, 1, 1, 1).validate().is_ok());
        assert_eq!(
            NetworkLayout::new(1, 1, 0, 1).validate().unwrap_err(),
            LayoutError::ZeroDimension { dimension: "hidden" }
        );
        assert!(NetworkLayout::new(0, 1, 1, 1).validate().is_err());
        for rate in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let layout = NetworkLayout::new(1, 1, 1, 1).with_learning_rate(rate);
            assert!(matches!(layout.validate(), Err(LayoutError::LearningRate { .. })));
        }
    }
}
