use crate::error::{GreenOpsError, Result};
use crate::models::{SensorReading, TEMPERATURE_SCALE};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const TEMP_MIN_C: f64 = -50.0;
pub const TEMP_MAX_C: f64 = 60.0;
pub const HUMIDITY_MIN_PCT: f64 = 0.0;
pub const HUMIDITY_MAX_PCT: f64 = 100.0;
pub const SOIL_MOISTURE_MIN_PCT: f64 = 0.0;
pub const SOIL_MOISTURE_MAX_PCT: f64 = 100.0;
pub const LIGHT_MIN: f64 = 0.0;
pub const LIGHT_MAX: f64 = 100_000.0;

/// Raw payload as sent by a sensing device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub light_level: f64,
    /// Unix epoch milliseconds
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// A payload that passed every range check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReading {
    pub device_id: String,
    pub temperature_c: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub light_level: f64,
    pub timestamp: DateTime<Utc>,
}

impl SensorPayload {
    pub fn validate(self) -> Result<ValidatedReading> {
        check_range("temperature", self.temperature, TEMP_MIN_C, TEMP_MAX_C)?;
        check_range("humidity", self.humidity, HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT)?;
        check_range(
            "soil moisture",
            self.soil_moisture,
            SOIL_MOISTURE_MIN_PCT,
            SOIL_MOISTURE_MAX_PCT,
        )?;
        check_range("light level", self.light_level, LIGHT_MIN, LIGHT_MAX)?;

        if self.device_id.trim().is_empty() {
            return Err(GreenOpsError::Validation {
                field: "device id",
                message: "must not be empty".into(),
            });
        }

        let timestamp = match self.timestamp {
            Some(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                GreenOpsError::Validation {
                    field: "timestamp",
                    message: format!("{} is not a valid epoch milliseconds value", ms),
                }
            })?,
            None => Utc::now(),
        };

        Ok(ValidatedReading {
            device_id: self.device_id,
            temperature_c: self.temperature,
            humidity: self.humidity,
            soil_moisture: self.soil_moisture,
            light_level: self.light_level,
            timestamp,
        })
    }
}

impl ValidatedReading {
    /// Convert to the stored form: temperature scaled by 100, the rest rounded
    /// to whole units.
    pub fn into_reading(self, greenhouse_id: i64) -> SensorReading {
        SensorReading::new(
            greenhouse_id,
            (self.temperature_c * TEMPERATURE_SCALE).round() as i32,
            self.humidity.round() as i32,
            self.soil_moisture.round() as i32,
            self.light_level.round() as i32,
        )
        .with_timestamp(self.timestamp)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(GreenOpsError::Validation {
            field,
            message: "must be a finite number".into(),
        });
    }
    if value < min || value > max {
        return Err(GreenOpsError::Validation {
            field,
            message: format!("{} outside allowed range [{}, {}]", value, min, max),
        });
    }
    Ok(())
}
