//! Advisory per-prediction telemetry for external renderers.
//!
//! Payloads are built only when a sink is installed on the simulation.

use std::sync::mpsc;

use serde::Serialize;

use crate::agent::AgentId;

/// What one agent saw, produced and was made of when it predicted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionTelemetry {
    pub agent_id: AgentId,
    pub tick_index: usize,
    /// Flattened model input window.
    pub input: Vec<f32>,
    /// The 15 predicted numbers.
    pub output: Vec<u8>,
    pub weights: Vec<Vec<f32>>,
}

/// Consumer of prediction telemetry.
pub trait TelemetrySink: Send {
    fn record(&mut self, payload: &PredictionTelemetry);
}

impl TelemetrySink for mpsc::Sender<PredictionTelemetry> {
    fn record(&mut self, payload: &PredictionTelemetry) {
        if self.send(payload.clone()).is_err() {
            tracing::trace!(agent_id = payload.agent_id, "telemetry receiver dropped");
        }
    }
}
