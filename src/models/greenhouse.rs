use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemMode {
    /// Decisions are applied to actuators.
    #[default]
    Auto,
    /// Decisions are logged only.
    Manual,
}

impl SystemMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMode::Auto => "AUTO",
            SystemMode::Manual => "MANUAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "automatic" => Some(SystemMode::Auto),
            "manual" => Some(SystemMode::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for SystemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greenhouse {
    pub id: Option<i64>,
    pub name: String,
    pub selected_crop_id: Option<i64>,
    pub planting_date: Option<NaiveDate>,
    pub mode: SystemMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Greenhouse {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            selected_crop_id: None,
            planting_date: None,
            mode: SystemMode::Auto,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_crop(mut self, crop_id: i64, planting_date: NaiveDate) -> Self {
        self.selected_crop_id = Some(crop_id);
        self.planting_date = Some(planting_date);
        self
    }

    pub fn with_mode(mut self, mode: SystemMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whole days elapsed since planting; negative when planting is in the future.
    pub fn days_since_planting(&self, today: NaiveDate) -> Option<i64> {
        self.planting_date
            .map(|planted| today.signed_duration_since(planted).num_days())
    }
}
