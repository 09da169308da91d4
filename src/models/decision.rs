use super::actuator::{Action, ActuatorKind};
use super::sensor::SensorSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The verdict for one actuator and the comparison that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorDecision {
    pub action: Action,
    pub reason: String,
}

impl ActuatorDecision {
    pub fn on(reason: impl Into<String>) -> Self {
        Self {
            action: Action::On,
            reason: reason.into(),
        }
    }

    pub fn off(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Off,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub pump: ActuatorDecision,
    pub fan: ActuatorDecision,
    pub light: ActuatorDecision,
    pub growth_stage: String,
    pub days_since_planting: i64,
}

impl DecisionResult {
    pub fn get(&self, kind: ActuatorKind) -> &ActuatorDecision {
        match kind {
            ActuatorKind::Pump => &self.pump,
            ActuatorKind::Fan => &self.fan,
            ActuatorKind::Light => &self.light,
        }
    }
}

/// One persisted record per actuator per decision run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLog {
    pub id: Option<i64>,
    pub greenhouse_id: i64,
    pub actuator: ActuatorKind,
    pub action: Action,
    pub reason: String,
    pub crop_name: Option<String>,
    pub growth_stage: Option<String>,
    pub sensor_values: Option<SensorSnapshot>,
    pub timestamp: DateTime<Utc>,
}

impl DecisionLog {
    pub fn new(greenhouse_id: i64, actuator: ActuatorKind, decision: &ActuatorDecision) -> Self {
        Self {
            id: None,
            greenhouse_id,
            actuator,
            action: decision.action,
            reason: decision.reason.clone(),
            crop_name: None,
            growth_stage: None,
            sensor_values: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_crop(mut self, crop_name: impl Into<String>, growth_stage: impl Into<String>) -> Self {
        self.crop_name = Some(crop_name.into());
        self.growth_stage = Some(growth_stage.into());
        self
    }

    pub fn with_sensor_values(mut self, snapshot: SensorSnapshot) -> Self {
        self.sensor_values = Some(snapshot);
        self
    }
}
