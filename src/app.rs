use crate::config::Config;
use crate::db::Database;
use crate::error::{GreenOpsError, Result};
use crate::logic::{DecisionRunner, RunOutcome, SensorPayload};
use crate::models::{
    Action, ActuatorCommands, ActuatorKind, Crop, Greenhouse, SensorReading, SensorStats,
    SystemMode,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub struct App {
    pub config: Config,
    pub db: Database,
    pub greenhouse: Greenhouse,
    greenhouse_id: i64,
}

impl App {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let greenhouse = match db.get_default_greenhouse()? {
            Some(g) => g,
            None => Self::create_default_greenhouse(&config, &db)?,
        };
        let greenhouse_id = greenhouse
            .id
            .ok_or_else(|| GreenOpsError::InvalidData("Greenhouse has no ID".into()))?;

        Ok(Self {
            config,
            db,
            greenhouse,
            greenhouse_id,
        })
    }

    /// Seed the greenhouse row from the config file on first run.
    fn create_default_greenhouse(config: &Config, db: &Database) -> Result<Greenhouse> {
        let section = &config.greenhouse;
        let mut greenhouse = Greenhouse::new(section.name.clone()).with_mode(section.system_mode()?);

        if let Some(ref crop_name) = section.crop {
            match (db.find_crop_by_name(crop_name)?, section.planting_date) {
                (Some(crop), Some(planted)) => {
                    if let Some(crop_id) = crop.id {
                        greenhouse = greenhouse.with_crop(crop_id, planted);
                    }
                }
                (Some(_), None) => {
                    tracing::warn!(crop = %crop_name, "No planting_date configured, crop not selected");
                }
                (None, _) => {
                    tracing::warn!(
                        crop = %crop_name,
                        "Configured crop not in catalogue - import it and run `greenops plant`"
                    );
                }
            }
        }

        let id = db.create_greenhouse(&greenhouse)?;
        greenhouse.id = Some(id);
        tracing::info!(greenhouse_id = id, name = %greenhouse.name, "Created greenhouse");
        Ok(greenhouse)
    }

    pub fn greenhouse_id(&self) -> i64 {
        self.greenhouse_id
    }

    pub fn selected_crop(&self) -> Result<Option<Crop>> {
        match self.greenhouse.selected_crop_id {
            Some(id) => self.db.get_crop(id),
            None => Ok(None),
        }
    }

    /// Map a device id to its greenhouse. Only the configured device is known.
    fn greenhouse_for_device(&self, device_id: Option<&str>) -> Result<i64> {
        match device_id {
            None => Ok(self.greenhouse_id),
            Some(id) if id == self.config.device.device_id => Ok(self.greenhouse_id),
            Some(id) => Err(GreenOpsError::NotFound(format!("device '{}'", id))),
        }
    }

    pub fn ingest(&self, payload: SensorPayload) -> Result<SensorReading> {
        let greenhouse_id = self.greenhouse_for_device(Some(&payload.device_id))?;
        let mut reading = payload.validate()?.into_reading(greenhouse_id);
        reading.id = Some(self.db.insert_sensor_reading(&reading)?);

        tracing::info!(
            greenhouse_id,
            temperature_c = reading.temperature_celsius(),
            humidity = reading.humidity,
            soil_moisture = reading.soil_moisture,
            light_level = reading.light_level,
            "Sensor reading ingested"
        );
        Ok(reading)
    }

    pub fn recent_readings(&self, limit: usize) -> Result<Vec<SensorReading>> {
        self.db.get_sensor_history(self.greenhouse_id, limit)
    }

    /// Readings inside a time window. An open end defaults to the epoch or now.
    pub fn readings_between(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<SensorReading>> {
        self.db.get_sensor_readings_between(
            self.greenhouse_id,
            since.unwrap_or(DateTime::UNIX_EPOCH),
            until.unwrap_or_else(Utc::now),
        )
    }

    pub fn stats(&self, limit: usize) -> Result<SensorStats> {
        Ok(SensorStats::from_readings(&self.recent_readings(limit)?))
    }

    pub fn plant(&mut self, crop_name: &str, planting_date: Option<NaiveDate>) -> Result<Crop> {
        let crop = self
            .db
            .find_crop_by_name(crop_name)?
            .ok_or_else(|| GreenOpsError::NotFound(format!("crop '{}'", crop_name)))?;
        let crop_id = crop
            .id
            .ok_or_else(|| GreenOpsError::InvalidData("Crop has no ID".into()))?;
        let planted = planting_date.unwrap_or_else(|| Local::now().date_naive());

        self.db
            .update_greenhouse_crop(self.greenhouse_id, crop_id, planted)?;
        self.greenhouse.selected_crop_id = Some(crop_id);
        self.greenhouse.planting_date = Some(planted);
        Ok(crop)
    }

    pub fn set_mode(&mut self, mode: SystemMode) -> Result<()> {
        self.db.update_greenhouse_mode(self.greenhouse_id, mode)?;
        self.greenhouse.mode = mode;
        Ok(())
    }

    pub fn decide(&self) -> Result<RunOutcome> {
        self.decide_on(Local::now().date_naive())
    }

    pub fn decide_on(&self, today: NaiveDate) -> Result<RunOutcome> {
        DecisionRunner::new(&self.db).run(self.greenhouse_id, today)
    }

    pub fn set_actuator(&self, kind: ActuatorKind, action: Action) -> Result<()> {
        self.db.set_actuator_state(self.greenhouse_id, kind, action)?;
        tracing::info!(actuator = %kind, action = %action, "Actuator set manually");
        Ok(())
    }

    pub fn commands(&self, device_id: Option<&str>) -> Result<ActuatorCommands> {
        let greenhouse_id = self.greenhouse_for_device(device_id)?;
        Ok(ActuatorCommands::from_states(
            &self.db.get_actuators(greenhouse_id)?,
        ))
    }

    /// Load crops from a JSON catalogue; names already present are skipped.
    pub fn import_crops(&self, path: &Path) -> Result<ImportSummary> {
        let content = std::fs::read_to_string(path)?;
        let crops: Vec<Crop> = serde_json::from_str(&content)?;
        let mut summary = ImportSummary::default();

        for crop in crops {
            if crop.stages.is_empty() {
                tracing::warn!(crop = %crop.name, "Skipping crop without growth stages");
                summary.skipped += 1;
                continue;
            }
            if self.db.find_crop_by_name(&crop.name)?.is_some() {
                tracing::debug!(crop = %crop.name, "Crop already exists");
                summary.skipped += 1;
                continue;
            }
            self.db.insert_crop(&crop)?;
            summary.inserted += 1;
        }

        Ok(summary)
    }
}
