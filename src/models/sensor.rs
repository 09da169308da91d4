use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature is stored scaled by 100 (2500 = 25.00°C).
pub const TEMPERATURE_SCALE: f64 = 100.0;

/// A stored point-in-time observation from a greenhouse device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: Option<i64>,
    pub greenhouse_id: i64,
    pub temperature: i32,
    pub humidity: i32,
    pub soil_moisture: i32,
    pub light_level: i32,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(
        greenhouse_id: i64,
        temperature: i32,
        humidity: i32,
        soil_moisture: i32,
        light_level: i32,
    ) -> Self {
        Self {
            id: None,
            greenhouse_id,
            temperature,
            humidity,
            soil_moisture,
            light_level,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn temperature_celsius(&self) -> f64 {
        self.temperature as f64 / TEMPERATURE_SCALE
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            temperature: self.temperature_celsius(),
            humidity: self.humidity,
            soil_moisture: self.soil_moisture,
            light_level: self.light_level,
        }
    }
}

/// Sensor values recorded alongside a decision, temperature in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub temperature: f64,
    pub humidity: i32,
    pub soil_moisture: i32,
    pub light_level: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Stat {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Self { min, max, avg }
    }
}

/// Aggregates over a window of recent readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStats {
    pub temperature: Stat,
    pub humidity: Stat,
    pub soil_moisture: Stat,
    pub light_level: Stat,
    pub count: usize,
}

impl SensorStats {
    pub fn from_readings(readings: &[SensorReading]) -> Self {
        Self {
            temperature: stat_of(readings, |r| r.temperature_celsius()),
            humidity: stat_of(readings, |r| r.humidity as f64),
            soil_moisture: stat_of(readings, |r| r.soil_moisture as f64),
            light_level: stat_of(readings, |r| r.light_level as f64),
            count: readings.len(),
        }
    }
}

fn stat_of(readings: &[SensorReading], value: impl Fn(&SensorReading) -> f64) -> Stat {
    let values: Vec<f64> = readings.iter().map(value).collect();
    Stat::from_values(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_unscaled() {
        let reading = SensorReading::new(1, 2500, 65, 70, 8000);
        assert!((reading.temperature_celsius() - 25.0).abs() < 1e-9);

        let reading = SensorReading::new(1, -1234, 65, 70, 8000);
        assert!((reading.temperature_celsius() - (-12.34)).abs() < 1e-9);
    }

    #[test]
    fn snapshot_carries_celsius() {
        let snapshot = SensorReading::new(1, 3650, 95, 22, 2000).snapshot();
        assert!((snapshot.temperature - 36.5).abs() < 1e-9);
        assert_eq!(snapshot.humidity, 95);
        assert_eq!(snapshot.soil_moisture, 22);
        assert_eq!(snapshot.light_level, 2000);
    }

    #[test]
    fn stats_over_empty_history_are_zeroed() {
        let stats = SensorStats::from_readings(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.temperature, Stat::default());
    }

    #[test]
    fn stats_min_max_avg() {
        let readings = vec![
            SensorReading::new(1, 2000, 50, 40, 1000),
            SensorReading::new(1, 3000, 70, 60, 3000),
        ];
        let stats = SensorStats::from_readings(&readings);

        assert_eq!(stats.count, 2);
        assert!((stats.temperature.min - 20.0).abs() < 1e-9);
        assert!((stats.temperature.max - 30.0).abs() < 1e-9);
        assert!((stats.humidity.avg - 60.0).abs() < 1e-9);
        assert!((stats.light_level.avg - 2000.0).abs() < 1e-9);
    }
}
