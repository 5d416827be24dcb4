//! Persisted simulation state.
//!
//! A snapshot stores one representative model (the best agent's), the draws
//! consumed so far and the counters. It is a JSON object with camelCase keys:
//!
//! ```json
//! {
//!   "version": 1,
//!   "modelArchitecture": { "kind": "recurrent", "steps": 10, ... },
//!   "modelWeights": [[...], ...],
//!   "historicalDraws": [{ "contestIndex": 1, "date": "2003-09-29", "numbers": [...] }],
//!   "generation": 2,
//!   "tickIndex": 17,
//!   "savedAt": "2024-01-01T00:00:00Z",
//!   "bestScore": 4.0
//! }
//! ```
//!
//! Only `modelArchitecture` is required. Payloads written by older versions
//! may lack the other keys; on load those keep their pre-load values.

use chrono::{DateTime, Utc};
use lotofacil_model::{BoxedModel, ModelArchitecture, ShapeMismatchError};
use serde::{Deserialize, Serialize};

use crate::draw::Draw;

pub const SNAPSHOT_VERSION: u32 = 1;

/// A snapshot could not be loaded. In-memory state is left untouched.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SnapshotError {
    #[display("malformed snapshot: {_0}")]
    #[from]
    Deserialization(serde_json::Error),
    #[display("snapshot has no model architecture")]
    MissingModel,
    #[display("snapshot model does not fit: {_0}")]
    #[from]
    ShapeMismatch(ShapeMismatchError),
    #[display("snapshot field {field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_architecture: Option<ModelArchitecture>,
    #[serde(default)]
    pub model_weights: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_draws: Option<Vec<Draw>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
}

impl Snapshot {
    /// Parses a snapshot. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuilds the stored model, checking its layout and its weights against
    /// its architecture.
    pub fn restore_model(&self) -> Result<BoxedModel, SnapshotError> {
        let architecture = self.model_architecture.ok_or(SnapshotError::MissingModel)?;
        architecture
            .layout()
            .validate()
            .map_err(|err| SnapshotError::InvalidField {
                field: "modelArchitecture",
                reason: err.to_string(),
            })?;
        Ok(architecture.build_with_weights(self.model_weights.clone())?)
    }
}
