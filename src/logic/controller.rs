use super::change::has_action_changed;
use super::rules::DecisionEngine;
use crate::error::Result;
use crate::models::{
    Action, ActuatorKind, ActuatorState, Crop, DecisionLog, DecisionResult, Greenhouse,
    SensorReading, SystemMode,
};
use chrono::NaiveDate;

/// Storage the decision run needs, passed in by the caller.
pub trait GreenhouseStore {
    fn greenhouse(&self, id: i64) -> Result<Option<Greenhouse>>;

    fn crop(&self, id: i64) -> Result<Option<Crop>>;

    fn latest_reading(&self, greenhouse_id: i64) -> Result<Option<SensorReading>>;

    /// `None` when the actuator has never been written.
    fn actuator(&self, greenhouse_id: i64, kind: ActuatorKind) -> Result<Option<ActuatorState>>;

    fn set_actuator(&self, greenhouse_id: i64, kind: ActuatorKind, state: Action) -> Result<()>;

    fn log_decision(&self, log: &DecisionLog) -> Result<()>;
}

/// Why a run did not evaluate. These are reportable, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotConfigured,
    NoSensorData,
    CropNotFound(i64),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotConfigured => write!(f, "Greenhouse not properly configured"),
            SkipReason::NoSensorData => write!(f, "No sensor data available"),
            SkipReason::CropNotFound(id) => write!(f, "Crop {} not found", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorUpdate {
    pub kind: ActuatorKind,
    pub previous: Option<Action>,
    pub action: Action,
    pub changed: bool,
    /// Whether the new state was written (AUTO mode and changed).
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct DecisionRun {
    pub greenhouse_id: i64,
    pub crop_name: String,
    pub mode: SystemMode,
    pub decisions: DecisionResult,
    pub updates: Vec<ActuatorUpdate>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(DecisionRun),
    Skipped(SkipReason),
}

pub struct DecisionRunner<'a, S: GreenhouseStore> {
    store: &'a S,
    engine: DecisionEngine,
}

impl<'a, S: GreenhouseStore> DecisionRunner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            engine: DecisionEngine::new(),
        }
    }

    /// Evaluate the greenhouse as of `today`, apply changed actuator states in
    /// AUTO mode, and log one decision per actuator.
    pub fn run(&self, greenhouse_id: i64, today: NaiveDate) -> Result<RunOutcome> {
        let Some(greenhouse) = self.store.greenhouse(greenhouse_id)? else {
            return Ok(RunOutcome::Skipped(SkipReason::NotConfigured));
        };
        let (Some(crop_id), Some(days_since_planting)) = (
            greenhouse.selected_crop_id,
            greenhouse.days_since_planting(today),
        ) else {
            return Ok(RunOutcome::Skipped(SkipReason::NotConfigured));
        };

        let Some(reading) = self.store.latest_reading(greenhouse_id)? else {
            return Ok(RunOutcome::Skipped(SkipReason::NoSensorData));
        };

        let Some(crop) = self.store.crop(crop_id)? else {
            return Ok(RunOutcome::Skipped(SkipReason::CropNotFound(crop_id)));
        };

        let decisions = self.engine.decide(&crop, &reading, days_since_planting)?;
        let snapshot = reading.snapshot();

        let mut updates = Vec::with_capacity(ActuatorKind::all().len());
        for &kind in ActuatorKind::all() {
            let decision = decisions.get(kind);
            let previous = self.store.actuator(greenhouse_id, kind)?.map(|a| a.state);
            let changed = has_action_changed(previous, decision.action);
            let applied = changed && greenhouse.mode == SystemMode::Auto;

            if applied {
                self.store.set_actuator(greenhouse_id, kind, decision.action)?;
                tracing::info!(
                    greenhouse_id,
                    actuator = %kind,
                    action = %decision.action,
                    reason = %decision.reason,
                    "Actuator toggled"
                );
            } else if changed {
                tracing::info!(
                    greenhouse_id,
                    actuator = %kind,
                    action = %decision.action,
                    "Manual mode, actuator change not applied"
                );
            }

            let log = DecisionLog::new(greenhouse_id, kind, decision)
                .with_crop(crop.name.as_str(), decisions.growth_stage.as_str())
                .with_sensor_values(snapshot);
            self.store.log_decision(&log)?;

            updates.push(ActuatorUpdate {
                kind,
                previous,
                action: decision.action,
                changed,
                applied,
            });
        }

        Ok(RunOutcome::Completed(DecisionRun {
            greenhouse_id,
            crop_name: crop.name,
            mode: greenhouse.mode,
            decisions,
            updates,
        }))
    }
}
