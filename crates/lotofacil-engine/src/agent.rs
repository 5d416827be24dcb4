use lotofacil_model::{BoxedModel, Model};

use crate::draw::NumberSet;

pub type AgentId = u32;

/// One predictor: an exclusively owned model plus its running score.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    score: f64,
    last_prediction: Option<NumberSet>,
    model: BoxedModel,
}

impl Agent {
    #[must_use]
    pub fn new(id: AgentId, model: BoxedModel) -> Self {
        Self {
            id,
            score: 0.0,
            last_prediction: None,
            model,
        }
    }

    /// Builds an agent around a deep copy of `model`, starting at `score`.
    #[must_use]
    pub fn from_model(id: AgentId, model: &dyn Model, score: f64) -> Self {
        Self {
            score,
            ..Self::new(id, model.clone_boxed())
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Sum of all rewards since creation.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// The numbers predicted on the most recent tick, if any.
    #[must_use]
    pub fn last_prediction(&self) -> Option<&NumberSet> {
        self.last_prediction.as_ref()
    }

    #[must_use]
    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn Model {
        self.model.as_mut()
    }

    pub(crate) fn record(&mut self, prediction: NumberSet, reward: f64) {
        self.score += reward;
        self.last_prediction = Some(prediction);
    }
}
