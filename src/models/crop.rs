use serde::{Deserialize, Serialize};

/// One phase of a crop's lifecycle with its environmental tolerance bands.
///
/// Temperatures are in °C, humidity and soil moisture in percent. `kc` is the
/// crop coefficient and is not consulted by any actuator rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropStage {
    pub name: String,
    pub duration: u32,
    pub kc: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub soil_moisture_min: f64,
    pub soil_moisture_max: f64,
}

/// A crop definition: stages are ordered and contiguous in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub stages: Vec<CropStage>,
}

impl Crop {
    pub fn new(name: impl Into<String>, stages: Vec<CropStage>) -> Self {
        Self {
            id: None,
            name: name.into(),
            scientific_name: None,
            stages,
        }
    }

    pub fn with_scientific_name(mut self, scientific_name: impl Into<String>) -> Self {
        self.scientific_name = Some(scientific_name.into());
        self
    }

    /// Total days covered by all stages.
    pub fn season_length(&self) -> u32 {
        self.stages.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn stage(
        name: &str,
        duration: u32,
        kc: f64,
        temp: (f64, f64),
        humidity: (f64, f64),
        soil_moisture: (f64, f64),
    ) -> CropStage {
        CropStage {
            name: name.to_string(),
            duration,
            kc,
            temp_min: temp.0,
            temp_max: temp.1,
            humidity_min: humidity.0,
            humidity_max: humidity.1,
            soil_moisture_min: soil_moisture.0,
            soil_moisture_max: soil_moisture.1,
        }
    }

    /// Maize: Initial 14d, Development 20d, Mid 25d, Late 20d.
    pub fn maize() -> Crop {
        Crop::new(
            "Maize",
            vec![
                stage("Initial", 14, 0.3, (15.0, 30.0), (40.0, 80.0), (40.0, 100.0)),
                stage("Development", 20, 0.6, (18.0, 32.0), (45.0, 85.0), (50.0, 100.0)),
                stage("Mid", 25, 1.0, (20.0, 35.0), (50.0, 90.0), (60.0, 100.0)),
                stage("Late", 20, 0.7, (18.0, 33.0), (40.0, 80.0), (40.0, 80.0)),
            ],
        )
        .with_scientific_name("Zea mays")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_decode_from_camel_case_json() {
        let json = r#"[{"name":"Initial","duration":14,"kc":0.3,"tempMin":15,"tempMax":30,
            "humidityMin":40,"humidityMax":80,"soilMoistureMin":40,"soilMoistureMax":100}]"#;
        let stages: Vec<CropStage> = serde_json::from_str(json).unwrap();

        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name, "Initial");
        assert_eq!(stages[0].duration, 14);
        assert_eq!(stages[0].soil_moisture_max, 100.0);
    }

    #[test]
    fn malformed_stage_json_is_rejected() {
        let json = r#"[{"name":"Initial","duration":"fourteen"}]"#;
        assert!(serde_json::from_str::<Vec<CropStage>>(json).is_err());
    }

    #[test]
    fn season_length_sums_durations() {
        assert_eq!(fixtures::maize().season_length(), 79);
    }

    #[test]
    fn crop_catalogue_entry_decodes_without_id() {
        let json = r#"{"name":"Beans","scientificName":"Phaseolus vulgaris","stages":[]}"#;
        let crop: Crop = serde_json::from_str(json).unwrap();

        assert_eq!(crop.id, None);
        assert_eq!(crop.scientific_name.as_deref(), Some("Phaseolus vulgaris"));
        assert!(crop.stages.is_empty());
    }
}
