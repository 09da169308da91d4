use super::{fan::FanRule, light::LightRule, pump::PumpRule, Rule, RuleContext};
use crate::error::{GreenOpsError, Result};
use crate::logic::growth_stage::resolve_growth_stage;
use crate::models::{ActuatorDecision, ActuatorKind, Crop, DecisionResult, SensorReading};

pub struct DecisionEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(PumpRule),
            Box::new(FanRule),
            Box::new(LightRule),
        ];

        Self { rules }
    }

    /// Resolve the crop's current stage and decide every actuator.
    ///
    /// Pure: the same crop, reading and day always give the same result.
    pub fn decide(
        &self,
        crop: &Crop,
        reading: &SensorReading,
        days_since_planting: i64,
    ) -> Result<DecisionResult> {
        let stage = resolve_growth_stage(&crop.stages, days_since_planting)?;
        let ctx = RuleContext {
            crop,
            stage,
            reading,
        };

        let result = DecisionResult {
            pump: self.evaluate_rule(ActuatorKind::Pump, &ctx)?,
            fan: self.evaluate_rule(ActuatorKind::Fan, &ctx)?,
            light: self.evaluate_rule(ActuatorKind::Light, &ctx)?,
            growth_stage: stage.name.to_string(),
            days_since_planting,
        };

        tracing::debug!(
            crop = %crop.name,
            stage = %result.growth_stage,
            days_in_stage = stage.days_in_stage,
            pump = %result.pump.action,
            fan = %result.fan.action,
            light = %result.light.action,
            "Evaluated actuator rules"
        );

        Ok(result)
    }

    pub fn evaluate_rule(
        &self,
        actuator: ActuatorKind,
        ctx: &RuleContext<'_>,
    ) -> Result<ActuatorDecision> {
        self.rules
            .iter()
            .find(|r| r.actuator() == actuator)
            .map(|rule| rule.evaluate(ctx))
            .ok_or_else(|| GreenOpsError::NotFound(format!("No rule for actuator {}", actuator)))
    }

    pub fn list_rules(&self) -> Vec<(ActuatorKind, &'static str)> {
        self.rules.iter().map(|r| (r.actuator(), r.name())).collect()
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}
