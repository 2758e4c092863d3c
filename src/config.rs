use crate::error::{HarvestWiseError, Result};
use crate::models::Coordinates;
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub farm: FarmConfig,
    pub openweathermap: Option<OpenWeatherMapConfig>,
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    pub user_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub soil_type: String,
    pub area_hectares: Option<f64>,
    pub region: Option<String>,
}

impl FarmConfig {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct PredictionConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    1000
}

impl PredictionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl std::fmt::Debug for PredictionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_ms", &self.backoff_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_idempotency_ttl_hours")]
    pub idempotency_ttl_hours: i64,
}

fn default_idempotency_ttl_hours() -> i64 {
    6
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_hours: default_idempotency_ttl_hours(),
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(HarvestWiseError::Config(format!(
                "Config file not found at {:?}. Run `harvestwise init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| HarvestWiseError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| HarvestWiseError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.farm.user_id.trim().is_empty() {
            return Err(HarvestWiseError::Config("farm.user_id must not be empty".into()));
        }
        if self.prediction.max_attempts == 0 {
            return Err(HarvestWiseError::Config(
                "prediction.max_attempts must be at least 1".into(),
            ));
        }
        if self.advisory.idempotency_ttl_hours < 0 {
            return Err(HarvestWiseError::Config(
                "advisory.idempotency_ttl_hours must not be negative".into(),
            ));
        }
        Ok(())
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

    /// Default path for writing new config files (~/.config/harvestwise/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HarvestWiseError::Config("Cannot determine config directory".into()))?
            .join("harvestwise");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up HarvestWise!");
        println!();

        println!("Farm");
        let user_id: String = prompt_text("  Farmer id", "farmer-1")?;
        let name: String = prompt_text("  Farm name", "Home Farm")?;
        let latitude: f64 = Input::new()
            .with_prompt("  Latitude")
            .default(18.52)
            .interact_text()
            .map_err(input_error)?;
        let longitude: f64 = Input::new()
            .with_prompt("  Longitude")
            .default(73.85)
            .interact_text()
            .map_err(input_error)?;
        let soil_type: String = prompt_text("  Soil type (Loamy, Clay, Sandy Loam, ...)", "Loamy")?;
        let area_hectares: f64 = Input::new()
            .with_prompt("  Area (hectares)")
            .default(1.0)
            .interact_text()
            .map_err(input_error)?;
        let region: String = prompt_text("  Region / state", "Maharashtra")?;

        println!();
        println!("Price prediction service");
        let base_url: String = prompt_text("  Base URL", "http://localhost:8000")?;

        println!();
        println!("OpenWeatherMap (leave API key blank to skip)");
        let owm_api_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_error)?;

        let openweathermap = if owm_api_key.is_empty() {
            None
        } else {
            Some(OpenWeatherMapConfig {
                api_key: owm_api_key,
                enabled: true,
            })
        };

        let config = Config {
            farm: FarmConfig {
                user_id,
                name,
                latitude,
                longitude,
                soil_type,
                area_hectares: Some(area_hectares),
                region: if region.is_empty() { None } else { Some(region) },
            },
            openweathermap,
            prediction: PredictionConfig {
                base_url,
                api_key: None,
                timeout_secs: default_timeout_secs(),
                max_attempts: default_max_attempts(),
                backoff_ms: default_backoff_ms(),
            },
            advisory: AdvisoryConfig::default(),
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| HarvestWiseError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# HarvestWise Configuration\n# Generated by `harvestwise init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!();
        println!("Configuration saved to {}", config_path.display());

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return result,
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("HARVESTWISE_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| HarvestWiseError::Config("Cannot determine data directory".into()))?
            .join("harvestwise");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("harvestwise.db"))
    }
}

fn prompt_text(prompt: &str, default: &str) -> Result<String> {
    Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()
        .map_err(input_error)
}

fn input_error(e: dialoguer::Error) -> HarvestWiseError {
    HarvestWiseError::Config(format!("Input error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
farm:
  user_id: farmer-7
  name: River Plot
  latitude: 18.5
  longitude: 73.8
  soil_type: Loamy
  area_hectares: 2.5
  region: Maharashtra
prediction:
  base_url: ${HARVESTWISE_TEST_PREDICT_URL}
"#;

    #[test]
    fn defaults_fill_optional_sections() {
        std::env::set_var("HARVESTWISE_TEST_PREDICT_URL", "http://predict.local");
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.prediction.base_url, "http://predict.local");
        assert_eq!(config.prediction.timeout(), Duration::from_secs(15));
        assert_eq!(config.prediction.max_attempts, 2);
        assert_eq!(config.prediction.backoff(), Duration::from_millis(1000));
        assert_eq!(config.advisory.idempotency_ttl_hours, 6);
        assert!(config.openweathermap.is_none());
        assert_eq!(config.farm.coordinates().latitude, 18.5);
    }

    #[test]
    fn unset_variables_are_left_in_place() {
        let out = Config::substitute_env_vars("key: ${HARVESTWISE_SURELY_UNSET_VAR}");
        assert_eq!(out, "key: ${HARVESTWISE_SURELY_UNSET_VAR}");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let yaml = SAMPLE.replace(
            "base_url: ${HARVESTWISE_TEST_PREDICT_URL}",
            "base_url: http://x\n  max_attempts: 0",
        );
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(HarvestWiseError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            SAMPLE.replace("${HARVESTWISE_TEST_PREDICT_URL}", "http://file.local"),
        )
        .unwrap();
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.farm.user_id, "farmer-7");
        assert_eq!(config.prediction.base_url, "http://file.local");
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(HarvestWiseError::Config(_))));
    }

    #[test]
    fn secrets_are_redacted() {
        let owm = OpenWeatherMapConfig {
            api_key: "super-secret".into(),
            enabled: true,
        };
        assert!(!format!("{:?}", owm).contains("super-secret"));
    }
}
