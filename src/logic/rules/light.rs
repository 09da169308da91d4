use super::{Rule, RuleContext};
use crate::models::{ActuatorDecision, ActuatorKind};

/// Raw light units below which grow lights switch on.
pub const LIGHT_THRESHOLD: i32 = 5000;

/// Supplemental grow lights against a fixed threshold.
///
/// Stages carry no light band, so this rule ignores crop and stage.
pub struct LightRule;

impl Rule for LightRule {
    fn actuator(&self) -> ActuatorKind {
        ActuatorKind::Light
    }

    fn name(&self) -> &'static str {
        "Supplemental Lighting"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> ActuatorDecision {
        let light_level = ctx.reading.light_level;

        if light_level < LIGHT_THRESHOLD {
            ActuatorDecision::on(format!(
                "Light level {} < threshold {}",
                light_level, LIGHT_THRESHOLD
            ))
        } else {
            ActuatorDecision::off(format!("Light level {} adequate", light_level))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::testing::evaluate_on_day;
    use crate::models::crop::fixtures::maize;
    use crate::models::{Action, SensorReading};

    fn with_light(light_level: i32) -> SensorReading {
        SensorReading::new(1, 2500, 65, 70, light_level)
    }

    #[test]
    fn dark_turns_light_on() {
        let decision = evaluate_on_day(&LightRule, &maize(), 47, &with_light(2000));
        assert_eq!(decision.action, Action::On);
        assert!(decision.reason.contains("Light level 2000"));
        assert!(decision.reason.contains("threshold 5000"));
    }

    #[test]
    fn bright_keeps_light_off() {
        let decision = evaluate_on_day(&LightRule, &maize(), 47, &with_light(8000));
        assert_eq!(decision.action, Action::Off);
        assert_eq!(decision.reason, "Light level 8000 adequate");
    }

    #[test]
    fn threshold_boundary() {
        assert_eq!(
            evaluate_on_day(&LightRule, &maize(), 47, &with_light(4999)).action,
            Action::On
        );
        assert_eq!(
            evaluate_on_day(&LightRule, &maize(), 47, &with_light(5000)).action,
            Action::Off
        );
    }

    #[test]
    fn same_verdict_in_every_stage() {
        for day in [0, 20, 47, 70, 200] {
            let decision = evaluate_on_day(&LightRule, &maize(), day, &with_light(2000));
            assert_eq!(decision.action, Action::On, "day {}", day);
        }
    }
}
