use crate::db::Database;
use crate::error::{GreenOpsError, Result};
use crate::logic::GreenhouseStore;
use crate::models::{
    Action, ActuatorKind, ActuatorState, Crop, CropStage, DecisionLog, Greenhouse, SensorReading,
    SensorSnapshot, SystemMode,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Row};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp_from_sql(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            warn!(timestamp = %s, "Unparsable timestamp in database, using now");
            Utc::now()
        })
}

// Crop Queries

/// A crop row before its stage list has been decoded.
struct CropRow {
    id: i64,
    name: String,
    scientific_name: Option<String>,
    stages: String,
}

impl CropRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            scientific_name: row.get("scientific_name")?,
            stages: row.get("stages")?,
        })
    }

    /// Decode the stored stage list. Malformed stage data is an error, never defaulted.
    fn decode(self) -> Result<Crop> {
        let stages: Vec<CropStage> = serde_json::from_str(&self.stages)?;
        Ok(Crop {
            id: Some(self.id),
            name: self.name,
            scientific_name: self.scientific_name,
            stages,
        })
    }
}

impl Database {
    pub fn insert_crop(&self, crop: &Crop) -> Result<i64> {
        let stages = serde_json::to_string(&crop.stages)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO crops (name, scientific_name, stages) VALUES (?1, ?2, ?3)",
                params![crop.name, crop.scientific_name, stages],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_crop(&self, id: i64) -> Result<Option<Crop>> {
        let row = self.with_conn(|conn| {
            conn.query_row("SELECT * FROM crops WHERE id = ?1", [id], CropRow::from_row)
                .optional()
                .map_err(Into::into)
        })?;
        row.map(CropRow::decode).transpose()
    }

    pub fn find_crop_by_name(&self, name: &str) -> Result<Option<Crop>> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM crops WHERE name = ?1 COLLATE NOCASE",
                [name],
                CropRow::from_row,
            )
            .optional()
            .map_err(Into::into)
        })?;
        row.map(CropRow::decode).transpose()
    }

    /// All crops with decodable stage data; malformed entries are logged and skipped.
    pub fn list_crops(&self) -> Result<Vec<Crop>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM crops ORDER BY name")?;
            let rows = stmt
                .query_map([], CropRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name.clone();
                row.decode()
                    .map_err(|e| warn!(crop = %name, error = %e, "Skipping crop with malformed stages"))
                    .ok()
            })
            .collect())
    }
}

// Greenhouse Queries

impl Database {
    pub fn create_greenhouse(&self, greenhouse: &Greenhouse) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO greenhouses
                    (name, selected_crop_id, planting_date, system_mode, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    greenhouse.name,
                    greenhouse.selected_crop_id,
                    greenhouse
                        .planting_date
                        .map(|d| d.format(DATE_FORMAT).to_string()),
                    greenhouse.mode.as_str(),
                    timestamp_to_sql(&greenhouse.created_at),
                    timestamp_to_sql(&greenhouse.updated_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_greenhouse(&self, id: i64) -> Result<Option<Greenhouse>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM greenhouses WHERE id = ?1",
                [id],
                row_to_greenhouse,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn get_default_greenhouse(&self) -> Result<Option<Greenhouse>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM greenhouses ORDER BY id LIMIT 1",
                [],
                row_to_greenhouse,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn update_greenhouse_mode(&self, id: i64, mode: SystemMode) -> Result<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE greenhouses SET system_mode = ?1, updated_at = ?2 WHERE id = ?3",
                params![mode.as_str(), timestamp_to_sql(&Utc::now()), id],
            )?;
            if updated == 0 {
                return Err(GreenOpsError::NotFound(format!("greenhouse {}", id)));
            }
            Ok(())
        })
    }

    pub fn update_greenhouse_crop(
        &self,
        id: i64,
        crop_id: i64,
        planting_date: NaiveDate,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                r#"
                UPDATE greenhouses SET
                    selected_crop_id = ?1, planting_date = ?2, updated_at = ?3
                WHERE id = ?4
                "#,
                params![
                    crop_id,
                    planting_date.format(DATE_FORMAT).to_string(),
                    timestamp_to_sql(&Utc::now()),
                    id,
                ],
            )?;
            if updated == 0 {
                return Err(GreenOpsError::NotFound(format!("greenhouse {}", id)));
            }
            Ok(())
        })
    }
}

fn row_to_greenhouse(row: &Row) -> rusqlite::Result<Greenhouse> {
    let mode_str: String = row.get("system_mode")?;
    let planting_str: Option<String> = row.get("planting_date")?;
    let created_at_str: String = row.get("created_at")?;
    let updated_at_str: String = row.get("updated_at")?;

    let mode = SystemMode::from_str(&mode_str).unwrap_or_else(|| {
        warn!(system_mode = %mode_str, "Unknown system_mode in database, defaulting to AUTO");
        SystemMode::Auto
    });
    let planting_date = planting_str.as_ref().and_then(|s| {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| warn!(planting_date = %s, "Unparsable planting_date in database, ignoring"))
            .ok()
    });

    Ok(Greenhouse {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        selected_crop_id: row.get("selected_crop_id")?,
        planting_date,
        mode,
        created_at: timestamp_from_sql(&created_at_str),
        updated_at: timestamp_from_sql(&updated_at_str),
    })
}

// Sensor Reading Queries

impl Database {
    pub fn insert_sensor_reading(&self, reading: &SensorReading) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO sensor_readings
                    (greenhouse_id, temperature, humidity, soil_moisture, light_level, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    reading.greenhouse_id,
                    reading.temperature,
                    reading.humidity,
                    reading.soil_moisture,
                    reading.light_level,
                    timestamp_to_sql(&reading.timestamp),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn latest_sensor_reading(&self, greenhouse_id: i64) -> Result<Option<SensorReading>> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT * FROM sensor_readings WHERE greenhouse_id = ?1
                ORDER BY timestamp DESC, id DESC LIMIT 1
                "#,
                [greenhouse_id],
                row_to_sensor_reading,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn get_sensor_history(&self, greenhouse_id: i64, limit: usize) -> Result<Vec<SensorReading>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT * FROM sensor_readings WHERE greenhouse_id = ?1
                ORDER BY timestamp DESC, id DESC LIMIT ?2
                "#,
            )?;
            let readings = stmt
                .query_map(params![greenhouse_id, limit as i64], row_to_sensor_reading)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(readings)
        })
    }

    /// Readings with `start <= timestamp <= end`, newest first.
    pub fn get_sensor_readings_between(
        &self,
        greenhouse_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT * FROM sensor_readings
                WHERE greenhouse_id = ?1 AND timestamp BETWEEN ?2 AND ?3
                ORDER BY timestamp DESC, id DESC
                "#,
            )?;
            let readings = stmt
                .query_map(
                    params![
                        greenhouse_id,
                        timestamp_to_sql(&start),
                        timestamp_to_sql(&end)
                    ],
                    row_to_sensor_reading,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(readings)
        })
    }
}

fn row_to_sensor_reading(row: &Row) -> rusqlite::Result<SensorReading> {
    let timestamp_str: String = row.get("timestamp")?;

    Ok(SensorReading {
        id: Some(row.get("id")?),
        greenhouse_id: row.get("greenhouse_id")?,
        temperature: row.get("temperature")?,
        humidity: row.get("humidity")?,
        soil_moisture: row.get("soil_moisture")?,
        light_level: row.get("light_level")?,
        timestamp: timestamp_from_sql(&timestamp_str),
    })
}

// Actuator Queries

impl Database {
    pub fn get_actuators(&self, greenhouse_id: i64) -> Result<Vec<ActuatorState>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM actuators WHERE greenhouse_id = ?1 ORDER BY id")?;
            let actuators = stmt
                .query_map([greenhouse_id], row_to_actuator)?
                .filter_map(|r| match r {
                    Ok(actuator) => actuator,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable actuator row");
                        None
                    }
                })
                .collect();
            Ok(actuators)
        })
    }

    pub fn find_actuator(
        &self,
        greenhouse_id: i64,
        kind: ActuatorKind,
    ) -> Result<Option<ActuatorState>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM actuators WHERE greenhouse_id = ?1 AND actuator_type = ?2",
                    params![greenhouse_id, kind.as_str()],
                    row_to_actuator,
                )
                .optional()?
                .flatten())
        })
    }

    /// Store a new state for `kind`, creating the actuator row on first use.
    pub fn set_actuator_state(
        &self,
        greenhouse_id: i64,
        kind: ActuatorKind,
        state: Action,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO actuators (greenhouse_id, actuator_type, state, last_toggled)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(greenhouse_id, actuator_type) DO UPDATE SET
                    state = excluded.state, last_toggled = excluded.last_toggled
                "#,
                params![
                    greenhouse_id,
                    kind.as_str(),
                    i32::from(state.is_on()),
                    timestamp_to_sql(&Utc::now()),
                ],
            )?;
            Ok(())
        })
    }
}

/// `None` when the stored type is not a known actuator.
fn row_to_actuator(row: &Row) -> rusqlite::Result<Option<ActuatorState>> {
    let type_str: String = row.get("actuator_type")?;
    let state: i32 = row.get("state")?;
    let last_toggled_str: String = row.get("last_toggled")?;

    let Some(kind) = ActuatorKind::from_str(&type_str) else {
        warn!(actuator_type = %type_str, "Unknown actuator_type in database, ignoring");
        return Ok(None);
    };

    Ok(Some(ActuatorState {
        id: row.get("id")?,
        greenhouse_id: row.get("greenhouse_id")?,
        kind,
        state: Action::from_bool(state != 0),
        last_toggled: timestamp_from_sql(&last_toggled_str),
    }))
}

// Decision Log Queries

impl Database {
    pub fn append_decision_log(&self, log: &DecisionLog) -> Result<i64> {
        let sensor_values = log
            .sensor_values
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO decision_logs
                    (greenhouse_id, actuator_type, action, reason, crop_name, growth_stage,
                     sensor_values, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    log.greenhouse_id,
                    log.actuator.as_str(),
                    log.action.as_str(),
                    log.reason,
                    log.crop_name,
                    log.growth_stage,
                    sensor_values,
                    timestamp_to_sql(&log.timestamp),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn get_decision_history(&self, greenhouse_id: i64, limit: usize) -> Result<Vec<DecisionLog>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT * FROM decision_logs WHERE greenhouse_id = ?1
                ORDER BY timestamp DESC, id DESC LIMIT ?2
                "#,
            )?;
            let logs = stmt
                .query_map(params![greenhouse_id, limit as i64], row_to_decision_log)?
                .filter_map(|r| match r {
                    Ok(log) => log,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable decision log row");
                        None
                    }
                })
                .collect();
            Ok(logs)
        })
    }
}

fn row_to_decision_log(row: &Row) -> rusqlite::Result<Option<DecisionLog>> {
    let type_str: String = row.get("actuator_type")?;
    let action_str: String = row.get("action")?;
    let sensor_values_str: Option<String> = row.get("sensor_values")?;
    let timestamp_str: String = row.get("timestamp")?;

    let (Some(actuator), Some(action)) = (
        ActuatorKind::from_str(&type_str),
        Action::from_str(&action_str),
    ) else {
        warn!(
            actuator_type = %type_str,
            action = %action_str,
            "Unknown actuator or action in decision log, ignoring"
        );
        return Ok(None);
    };

    let sensor_values = sensor_values_str.as_ref().and_then(|s| {
        serde_json::from_str::<SensorSnapshot>(s)
            .map_err(|e| warn!(error = %e, "Unparsable sensor_values in decision log"))
            .ok()
    });

    Ok(Some(DecisionLog {
        id: Some(row.get("id")?),
        greenhouse_id: row.get("greenhouse_id")?,
        actuator,
        action,
        reason: row.get("reason")?,
        crop_name: row.get("crop_name")?,
        growth_stage: row.get("growth_stage")?,
        sensor_values,
        timestamp: timestamp_from_sql(&timestamp_str),
    }))
}

impl GreenhouseStore for Database {
    fn greenhouse(&self, id: i64) -> Result<Option<Greenhouse>> {
        self.get_greenhouse(id)
    }

    fn crop(&self, id: i64) -> Result<Option<Crop>> {
        self.get_crop(id)
    }

    fn latest_reading(&self, greenhouse_id: i64) -> Result<Option<SensorReading>> {
        self.latest_sensor_reading(greenhouse_id)
    }

    fn actuator(&self, greenhouse_id: i64, kind: ActuatorKind) -> Result<Option<ActuatorState>> {
        self.find_actuator(greenhouse_id, kind)
    }

    fn set_actuator(&self, greenhouse_id: i64, kind: ActuatorKind, state: Action) -> Result<()> {
        self.set_actuator_state(greenhouse_id, kind, state)
    }

    fn log_decision(&self, log: &DecisionLog) -> Result<()> {
        self.append_decision_log(log).map(|_| ())
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crop::fixtures::maize;
    use crate::models::ActuatorDecision;
    use chrono::Duration;

    fn db_with_greenhouse() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_greenhouse(&Greenhouse::new("Test House")).unwrap();
        (db, id)
    }

    #[test]
    fn crop_round_trips_with_stages() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_crop(&maize()).unwrap();

        let crop = db.get_crop(id).unwrap().unwrap();
        assert_eq!(crop.id, Some(id));
        assert_eq!(crop.name, "Maize");
        assert_eq!(crop.scientific_name.as_deref(), Some("Zea mays"));
        assert_eq!(crop.stages, maize().stages);

        let by_name = db.find_crop_by_name("maize").unwrap().unwrap();
        assert_eq!(by_name.id, Some(id));
        assert!(db.get_crop(id + 1).unwrap().is_none());
    }

    #[test]
    fn malformed_stage_data_fails_fast() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO crops (name, stages) VALUES ('Broken', '{not json')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let err = db.find_crop_by_name("Broken").unwrap_err();
        assert!(matches!(err, GreenOpsError::Json(_)));

        // Listing skips it instead of failing
        db.insert_crop(&maize()).unwrap();
        let crops = db.list_crops().unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].name, "Maize");
    }

    #[test]
    fn greenhouse_crop_and_mode_updates() {
        let (db, id) = db_with_greenhouse();
        let crop_id = db.insert_crop(&maize()).unwrap();
        let planted = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

        db.update_greenhouse_crop(id, crop_id, planted).unwrap();
        db.update_greenhouse_mode(id, SystemMode::Manual).unwrap();

        let greenhouse = db.get_greenhouse(id).unwrap().unwrap();
        assert_eq!(greenhouse.selected_crop_id, Some(crop_id));
        assert_eq!(greenhouse.planting_date, Some(planted));
        assert_eq!(greenhouse.mode, SystemMode::Manual);

        assert_eq!(db.get_default_greenhouse().unwrap().unwrap().id, Some(id));
        assert!(matches!(
            db.update_greenhouse_mode(id + 10, SystemMode::Auto),
            Err(GreenOpsError::NotFound(_))
        ));
    }

    #[test]
    fn latest_reading_is_newest_by_timestamp() {
        let (db, id) = db_with_greenhouse();
        let now = Utc::now();

        db.insert_sensor_reading(&SensorReading::new(id, 2500, 60, 50, 8000).with_timestamp(now))
            .unwrap();
        db.insert_sensor_reading(
            &SensorReading::new(id, 1800, 40, 30, 100).with_timestamp(now - Duration::hours(1)),
        )
        .unwrap();

        let latest = db.latest_sensor_reading(id).unwrap().unwrap();
        assert_eq!(latest.temperature, 2500);

        let history = db.get_sensor_history(id, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].temperature, 1800);

        assert!(db.latest_sensor_reading(id + 1).unwrap().is_none());
    }

    #[test]
    fn readings_between_include_both_ends() {
        let (db, id) = db_with_greenhouse();
        let start = DateTime::parse_from_rfc3339("2026-10-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end = start + Duration::hours(6);

        for (offset, temperature) in [(-1, 1000), (0, 2000), (3, 2500), (6, 3000), (7, 4000)] {
            db.insert_sensor_reading(
                &SensorReading::new(id, temperature, 60, 50, 8000)
                    .with_timestamp(start + Duration::hours(offset)),
            )
            .unwrap();
        }

        let readings = db.get_sensor_readings_between(id, start, end).unwrap();
        let temperatures: Vec<i32> = readings.iter().map(|r| r.temperature).collect();
        assert_eq!(temperatures, vec![3000, 2500, 2000]);

        assert!(db
            .get_sensor_readings_between(id + 1, start, end)
            .unwrap()
            .is_empty());
        assert!(db
            .get_sensor_readings_between(id, end, start)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn actuator_upsert() {
        let (db, id) = db_with_greenhouse();
        assert!(db.find_actuator(id, ActuatorKind::Pump).unwrap().is_none());

        db.set_actuator_state(id, ActuatorKind::Pump, Action::On).unwrap();
        let pump = db.find_actuator(id, ActuatorKind::Pump).unwrap().unwrap();
        assert_eq!(pump.state, Action::On);

        db.set_actuator_state(id, ActuatorKind::Pump, Action::Off).unwrap();
        let again = db.find_actuator(id, ActuatorKind::Pump).unwrap().unwrap();
        assert_eq!(again.id, pump.id);
        assert_eq!(again.state, Action::Off);

        db.set_actuator_state(id, ActuatorKind::Light, Action::On).unwrap();
        let all = db.get_actuators(id).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn decision_history_newest_first() {
        let (db, id) = db_with_greenhouse();
        let snapshot = SensorReading::new(id, 3600, 95, 22, 2000).snapshot();
        let now = Utc::now();

        let mut older = DecisionLog::new(id, ActuatorKind::Fan, &ActuatorDecision::off("older"));
        older.timestamp = now - Duration::minutes(5);
        db.append_decision_log(&older).unwrap();

        let newer = DecisionLog::new(id, ActuatorKind::Pump, &ActuatorDecision::on("newer"))
            .with_crop("Maize", "Mid")
            .with_sensor_values(snapshot);
        db.append_decision_log(&newer).unwrap();

        let history = db.get_decision_history(id, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "newer");
        assert_eq!(history[0].actuator, ActuatorKind::Pump);
        assert_eq!(history[0].growth_stage.as_deref(), Some("Mid"));
        assert_eq!(history[0].sensor_values, Some(snapshot));
        assert_eq!(history[1].reason, "older");

        assert_eq!(db.get_decision_history(id, 1).unwrap().len(), 1);
    }
}
