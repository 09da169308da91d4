use super::{Rule, RuleContext};
use crate::models::{ActuatorDecision, ActuatorKind, TEMPERATURE_SCALE};

/// Ventilation fan driven by air temperature and humidity.
///
/// Checked in order, first match wins:
/// 1. Temperature above stage max: ON
/// 2. Humidity above stage max: ON
/// 3. Temperature below stage min: OFF
/// 4. Humidity below stage min: OFF
/// 5. Otherwise: OFF, conditions optimal
///
/// There is no heater or humidifier, so readings below a minimum are only
/// reported, never corrected.
pub struct FanRule;

impl Rule for FanRule {
    fn actuator(&self) -> ActuatorKind {
        ActuatorKind::Fan
    }

    fn name(&self) -> &'static str {
        "Ventilation"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> ActuatorDecision {
        let stage = ctx.stage.stage;
        let temp_c = ctx.reading.temperature_celsius();
        let humidity = ctx.reading.humidity;
        let humidity_pct = f64::from(humidity);

        if temp_c > stage.temp_max {
            ActuatorDecision::on(format!(
                "Temperature {}°C > max {}°C",
                format_celsius(ctx.reading.temperature),
                stage.temp_max
            ))
        } else if humidity_pct > stage.humidity_max {
            ActuatorDecision::on(format!(
                "Humidity {}% > max {}%",
                humidity, stage.humidity_max
            ))
        } else if temp_c < stage.temp_min {
            ActuatorDecision::off(format!(
                "Temperature {}°C < min {}°C",
                format_celsius(ctx.reading.temperature),
                stage.temp_min
            ))
        } else if humidity_pct < stage.humidity_min {
            ActuatorDecision::off(format!(
                "Humidity {}% < min {}%",
                humidity, stage.humidity_min
            ))
        } else {
            ActuatorDecision::off(format!("{}, conditions optimal", ctx.label()))
        }
    }
}

/// One decimal place, with exact halves rounded away from zero.
///
/// Only hundredths ending in 25 or 75 are exact halves in binary. Every other
/// value already formats to its nearest tenth.
fn format_celsius(hundredths: i32) -> String {
    if hundredths % 50 == 25 || hundredths % 50 == -25 {
        let tenths = (hundredths + hundredths.signum() * 5) / 10;
        return format!("{:.1}", f64::from(tenths) / 10.0);
    }
    format!("{:.1}", f64::from(hundredths) / TEMPERATURE_SCALE)
}
