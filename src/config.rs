use crate::error::{GreenOpsError, Result};
use crate::models::SystemMode;
use chrono::NaiveDate;
use dialoguer::{Input, Select};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub greenhouse: GreenhouseConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GreenhouseConfig {
    pub name: String,
    /// Crop name as it appears in the crop catalogue
    pub crop: Option<String>,
    pub planting_date: Option<NaiveDate>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "auto".into()
}

impl GreenhouseConfig {
    pub fn system_mode(&self) -> Result<SystemMode> {
        SystemMode::from_str(&self.mode).ok_or_else(|| {
            GreenOpsError::Config(format!(
                "invalid greenhouse mode '{}' - expected auto or manual",
                self.mode
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Identifier the sensing device reports with each payload
    pub device_id: String,
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(GreenOpsError::Config(format!(
                "Config file not found at {:?}. Run `greenops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| GreenOpsError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&config_str)
    }

    fn parse(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| GreenOpsError::Config(format!("Failed to parse config: {}", e)))?;

        // Fail on a bad mode at load time rather than on first use
        config.greenhouse.system_mode()?;

        Ok(config)
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let default_path = Self::default_config_path()?;
        Ok(default_path)
    }

    /// Default path for writing new config files (~/.config/greenops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GreenOpsError::Config("Cannot determine config directory".into()))?
            .join("greenops");
        Ok(config_dir.join("config.yaml"))
    }

    fn setup_banner(config_path: &Path) -> String {
        if config_path.exists() {
            format!(
                "GreenOps setup (replacing existing config at {})",
                config_path.display()
            )
        } else {
            "GreenOps setup".into()
        }
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        let config_path = Self::default_config_path()?;

        println!();
        println!("{}", Self::setup_banner(&config_path));
        println!();

        println!("Greenhouse");
        let name: String = Input::new()
            .with_prompt("  Greenhouse name")
            .default("Main Greenhouse".into())
            .interact_text()
            .map_err(|e| GreenOpsError::Config(format!("Input error: {}", e)))?;

        let crop: String = Input::new()
            .with_prompt("  Crop (leave blank to choose later)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| GreenOpsError::Config(format!("Input error: {}", e)))?;

        let planting_date = if crop.is_empty() {
            None
        } else {
            let date: String = Input::new()
                .with_prompt("  Planting date (YYYY-MM-DD)")
                .default(chrono::Local::now().date_naive().to_string())
                .validate_with(|input: &String| -> std::result::Result<(), String> {
                    NaiveDate::parse_from_str(input, "%Y-%m-%d")
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(|e| GreenOpsError::Config(format!("Input error: {}", e)))?;
            NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()
        };

        let modes = ["auto", "manual"];
        let mode_index = Select::new()
            .with_prompt("  System mode")
            .items(&modes)
            .default(0)
            .interact()
            .map_err(|e| GreenOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        println!("Sensing device");
        let device_id: String = Input::new()
            .with_prompt("  Device ID")
            .default("esp32-01".into())
            .interact_text()
            .map_err(|e| GreenOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            greenhouse: GreenhouseConfig {
                name,
                crop: (!crop.is_empty()).then_some(crop),
                planting_date,
                mode: modes[mode_index].into(),
            },
            device: DeviceConfig { device_id },
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)?;

        let content = format!(
            "# GreenOps Configuration\n# Generated by `greenops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| GreenOpsError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("GREENOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| GreenOpsError::Config("Cannot determine data directory".into()))?
            .join("greenops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("greenops.db"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            greenhouse: GreenhouseConfig {
                name: "Main Greenhouse".into(),
                crop: None,
                planting_date: None,
                mode: default_mode(),
            },
            device: DeviceConfig {
                device_id: "esp32-01".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let yaml = r#"
greenhouse:
  name: North House
  crop: Maize
  planting_date: 2026-09-01
  mode: manual
device:
  device_id: esp32-07
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.greenhouse.name, "North House");
        assert_eq!(config.greenhouse.crop.as_deref(), Some("Maize"));
        assert_eq!(
            config.greenhouse.planting_date,
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(config.greenhouse.system_mode().unwrap(), SystemMode::Manual);
        assert_eq!(config.device.device_id, "esp32-07");
    }

    #[test]
    fn mode_defaults_to_auto() {
        let yaml = "greenhouse:\n  name: A\ndevice:\n  device_id: d1\n";
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.greenhouse.system_mode().unwrap(), SystemMode::Auto);
        assert!(config.greenhouse.crop.is_none());
    }

    #[test]
    fn invalid_mode_is_a_config_error() {
        let yaml = "greenhouse:\n  name: A\n  mode: sometimes\ndevice:\n  device_id: d1\n";
        assert!(matches!(
            Config::parse(yaml),
            Err(GreenOpsError::Config(_))
        ));
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("GREENOPS_TEST_DEVICE_ID", "esp32-env");
        let yaml = "greenhouse:\n  name: A\ndevice:\n  device_id: ${GREENOPS_TEST_DEVICE_ID}\n";
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.device.device_id, "esp32-env");
    }

    #[test]
    fn setup_banner_mentions_existing_config() {
        let path = std::env::temp_dir().join(format!("greenops-banner-{}.yaml", std::process::id()));
        std::fs::remove_file(&path).ok();
        assert_eq!(Config::setup_banner(&path), "GreenOps setup");

        std::fs::write(&path, "greenhouse:\n  name: A\n").unwrap();
        let banner = Config::setup_banner(&path);
        std::fs::remove_file(&path).ok();
        assert!(banner.contains("replacing existing config"));
        assert!(!banner.contains("No configuration found"));
    }

    #[test]
    fn unset_env_vars_are_left_in_place() {
        let content = Config::substitute_env_vars("id: ${GREENOPS_TEST_SURELY_UNSET}").unwrap();
        assert_eq!(content, "id: ${GREENOPS_TEST_SURELY_UNSET}");
    }
}
