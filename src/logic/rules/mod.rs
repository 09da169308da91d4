pub mod engine;
pub mod fan;
pub mod light;
pub mod pump;

pub use engine::DecisionEngine;

use super::growth_stage::GrowthStage;
use crate::models::{ActuatorDecision, ActuatorKind, Crop, SensorReading};

/// Everything a rule may look at for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub crop: &'a Crop,
    pub stage: GrowthStage<'a>,
    pub reading: &'a SensorReading,
}

impl RuleContext<'_> {
    /// "Maize (Mid)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.crop.name, self.stage.name)
    }
}

/// Trait for actuator rules
pub trait Rule: Send + Sync {
    /// The actuator this rule drives
    fn actuator(&self) -> ActuatorKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Decide ON/OFF for the actuator and explain why
    fn evaluate(&self, ctx: &RuleContext<'_>) -> ActuatorDecision;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::logic::growth_stage::resolve_growth_stage;

    /// Evaluate `rule` against `crop` on `day` with the given raw reading values.
    pub fn evaluate_on_day(
        rule: &dyn Rule,
        crop: &Crop,
        day: i64,
        reading: &SensorReading,
    ) -> ActuatorDecision {
        let stage = resolve_growth_stage(&crop.stages, day).unwrap();
        let ctx = RuleContext {
            crop,
            stage,
            reading,
        };
        rule.evaluate(&ctx)
    }
}
