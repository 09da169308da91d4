mod app;
mod cli;
mod config;
mod db;
mod error;
mod logic;
mod models;

use app::App;
use clap::Parser;
use cli::{Cli, Commands, CropCommands};
use config::Config;
use db::Database;
use error::{GreenOpsError, Result};
use logic::{RunOutcome, SensorPayload};
use models::{Action, ActuatorKind, SystemMode};
use tracing_subscriber::EnvFilter;

fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        let (config, path) = Config::setup_interactive()?;
        let db = Database::open(&Config::db_path(cli.data_dir.as_ref())?)?;
        let app = App::new(config, db)?;
        println!(
            "Greenhouse '{}' ready (config: {})",
            app.greenhouse.name,
            path.display()
        );
        return Ok(());
    }

    let config = match Config::load(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Run `greenops init` to create a configuration.");
            std::process::exit(1);
        }
    };

    let db = Database::open(&Config::db_path(cli.data_dir.as_ref())?)?;
    let mut app = App::new(config, db)?;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Check => check(&app, verbose),
        Commands::Crops { command } => match command {
            CropCommands::List => list_crops(&app),
            CropCommands::Import { path } => {
                let summary = app.import_crops(&path)?;
                println!(
                    "Imported {} crop(s), skipped {}",
                    summary.inserted, summary.skipped
                );
                Ok(())
            }
        },
        Commands::Plant { crop, date } => {
            let crop = app.plant(&crop, date)?;
            println!(
                "Planted {} on {} ({} day season)",
                crop.name,
                app.greenhouse
                    .planting_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                crop.season_length()
            );
            Ok(())
        }
        Commands::Mode { mode } => {
            let mode = SystemMode::from_str(&mode).ok_or_else(|| GreenOpsError::Validation {
                field: "mode",
                message: format!("'{}' is not auto or manual", mode),
            })?;
            app.set_mode(mode)?;
            println!("Mode set to {}", mode);
            Ok(())
        }
        Commands::Ingest {
            device_id,
            temperature,
            humidity,
            soil_moisture,
            light_level,
            timestamp,
        } => {
            let payload = SensorPayload {
                device_id: device_id.unwrap_or_else(|| app.config.device.device_id.clone()),
                temperature,
                humidity,
                soil_moisture,
                light_level,
                timestamp,
            };
            let reading = app.ingest(payload)?;
            println!(
                "Recorded reading #{} at {}",
                reading.id.unwrap_or_default(),
                reading.timestamp.to_rfc3339()
            );
            Ok(())
        }
        Commands::Readings {
            limit,
            since,
            until,
        } => {
            let readings = if since.is_some() || until.is_some() {
                app.readings_between(since, until)?
            } else {
                app.recent_readings(limit)?
            };
            if readings.is_empty() {
                println!("No sensor readings yet");
            }
            for r in readings {
                println!(
                    "{}  {:>6.2}°C  {:>3}% RH  {:>3}% soil  {:>6} light",
                    r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    r.temperature_celsius(),
                    r.humidity,
                    r.soil_moisture,
                    r.light_level
                );
            }
            Ok(())
        }
        Commands::Stats { limit } => {
            let stats = app.stats(limit)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Decide => decide(&app),
        Commands::History { limit } => {
            for log in app.db.get_decision_history(app.greenhouse_id(), limit)? {
                println!(
                    "{}  {:<5} {:<3}  [{} / {}]  {}",
                    log.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    log.actuator,
                    log.action,
                    log.crop_name.as_deref().unwrap_or("-"),
                    log.growth_stage.as_deref().unwrap_or("-"),
                    log.reason
                );
            }
            Ok(())
        }
        Commands::Actuator { kind, state } => {
            let kind = ActuatorKind::from_str(&kind).ok_or_else(|| GreenOpsError::Validation {
                field: "actuator",
                message: format!("'{}' is not pump, fan or light", kind),
            })?;
            let action = Action::from_str(&state).ok_or_else(|| GreenOpsError::Validation {
                field: "state",
                message: format!("'{}' is not on or off", state),
            })?;
            if app.greenhouse.mode == SystemMode::Auto {
                eprintln!("Note: greenhouse is in AUTO mode, the next decision run may override this");
            }
            app.set_actuator(kind, action)?;
            println!("{} set to {}", kind, action);
            Ok(())
        }
        Commands::Commands { device_id } => {
            let commands = app.commands(device_id.as_deref())?;
            println!("{}", serde_json::to_string(&commands)?);
            Ok(())
        }
    }
}

fn check(app: &App, verbose: u8) -> Result<()> {
    println!("Config OK");
    println!("  Database:   {}", app.db.path().display());
    println!(
        "  Greenhouse: {} (#{}), mode {}",
        app.greenhouse.name,
        app.greenhouse_id(),
        app.greenhouse.mode
    );
    println!("  Device:     {}", app.config.device.device_id);

    match app.selected_crop()? {
        Some(crop) => {
            let planted = app
                .greenhouse
                .planting_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".into());
            println!("  Crop:       {} planted {}", crop.name, planted);
        }
        None => println!("  Crop:       none selected (run `greenops plant --crop <NAME>`)"),
    }

    let crops = app.db.list_crops()?.len();
    println!("  Catalogue:  {} crop(s)", crops);

    match app.db.latest_sensor_reading(app.greenhouse_id())? {
        Some(r) => println!("  Latest:     {}", r.timestamp.to_rfc3339()),
        None => println!("  Latest:     no sensor data"),
    }

    if verbose > 0 {
        for state in app.db.get_actuators(app.greenhouse_id())? {
            println!("  {:<5} {}", state.kind, state.state);
        }
    }
    Ok(())
}

fn list_crops(app: &App) -> Result<()> {
    let crops = app.db.list_crops()?;
    if crops.is_empty() {
        println!("Crop catalogue is empty. Import one with `greenops crops import <FILE>`");
        return Ok(());
    }
    for crop in crops {
        match crop.scientific_name {
            Some(ref sci) => println!("{} ({}), {} days", crop.name, sci, crop.season_length()),
            None => println!("{}, {} days", crop.name, crop.season_length()),
        }
        for stage in &crop.stages {
            println!(
                "  {:<12} {:>3}d  temp {}-{}°C  humidity {}-{}%  soil {}-{}%",
                stage.name,
                stage.duration,
                stage.temp_min,
                stage.temp_max,
                stage.humidity_min,
                stage.humidity_max,
                stage.soil_moisture_min,
                stage.soil_moisture_max
            );
        }
    }
    Ok(())
}

fn decide(app: &App) -> Result<()> {
    match app.decide()? {
        RunOutcome::Skipped(reason) => {
            println!("Skipped: {}", reason);
        }
        RunOutcome::Completed(run) => {
            println!(
                "{} ({}), day {}, mode {}",
                run.crop_name,
                run.decisions.growth_stage,
                run.decisions.days_since_planting,
                run.mode
            );
            for update in &run.updates {
                let decision = run.decisions.get(update.kind);
                let marker = match (update.changed, update.applied) {
                    (true, true) => "applied",
                    (true, false) => "not applied",
                    (false, _) => "unchanged",
                };
                println!(
                    "  {:<5} {:<3} {:<11} {}",
                    update.kind, update.action, marker, decision.reason
                );
            }
        }
    }
    Ok(())
}
