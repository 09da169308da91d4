use super::{Rule, RuleContext};
use crate::models::{ActuatorDecision, ActuatorKind};

/// Irrigation pump driven by soil moisture against the stage band.
///
/// - Below the stage minimum: ON
/// - Above the stage maximum: OFF
/// - Within the band (inclusive): OFF
pub struct PumpRule;

impl Rule for PumpRule {
    fn actuator(&self) -> ActuatorKind {
        ActuatorKind::Pump
    }

    fn name(&self) -> &'static str {
        "Soil Moisture Irrigation"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> ActuatorDecision {
        let stage = ctx.stage.stage;
        let soil_moisture = ctx.reading.soil_moisture;
        let moisture = f64::from(soil_moisture);

        if moisture < stage.soil_moisture_min {
            ActuatorDecision::on(format!(
                "{}, soil moisture {}% < threshold {}%",
                ctx.label(),
                soil_moisture,
                stage.soil_moisture_min
            ))
        } else if moisture > stage.soil_moisture_max {
            ActuatorDecision::off(format!(
                "{}, soil moisture {}% > max {}%",
                ctx.label(),
                soil_moisture,
                stage.soil_moisture_max
            ))
        } else {
            ActuatorDecision::off(format!(
                "{}, soil moisture {}% within range",
                ctx.label(),
                soil_moisture
            ))
        }
    }
}
