use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "greenops",
    version,
    about = "Greenhouse actuator control from crop growth-stage rules"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config and show greenhouse status
    Check,
    /// Manage the crop catalogue
    Crops {
        #[command(subcommand)]
        command: CropCommands,
    },
    /// Select the crop growing in the greenhouse
    Plant {
        /// Crop name from the catalogue
        #[arg(long)]
        crop: String,
        /// Planting date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Switch between automatic and manual actuator control
    Mode {
        /// auto or manual
        mode: String,
    },
    /// Record a sensor reading from a device
    Ingest {
        #[arg(long)]
        device_id: Option<String>,
        /// Air temperature in °C
        #[arg(long, allow_negative_numbers = true)]
        temperature: f64,
        /// Relative humidity in %
        #[arg(long)]
        humidity: f64,
        /// Soil moisture in %
        #[arg(long)]
        soil_moisture: f64,
        #[arg(long)]
        light_level: f64,
        /// Unix epoch milliseconds, defaults to now
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Show recent sensor readings, or those inside a time window
    Readings {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Window start (RFC 3339), ignores --limit
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Window end (RFC 3339), defaults to now
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Min/max/avg over recent sensor readings
    Stats {
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,
    },
    /// Evaluate the rules against the latest reading and apply the result
    Decide,
    /// Show the decision log
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Set an actuator by hand
    Actuator {
        /// pump, fan or light
        kind: String,
        /// on or off
        state: String,
    },
    /// Print the actuator states a device should apply, as JSON
    Commands {
        #[arg(long)]
        device_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CropCommands {
    /// List crops and their growth stages
    List,
    /// Import crops from a JSON file: [{name, scientificName, stages: [...]}]
    Import { path: PathBuf },
}
