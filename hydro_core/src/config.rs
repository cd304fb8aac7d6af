//! Configuration file support for Hydro.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/hydro/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub food: FoodConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Weather lookup configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature assumed when the lookup fails
    #[serde(default = "default_fallback_celsius")]
    pub fallback_celsius: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            fallback_celsius: default_fallback_celsius(),
        }
    }
}

/// Nutrition lookup configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FoodConfig {
    #[serde(default = "default_food_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Offline nutrition table: food name -> kcal per 100 g
    #[serde(default)]
    pub local: HashMap<String, f64>,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            base_url: default_food_base_url(),
            timeout_secs: default_timeout_secs(),
            local: HashMap::new(),
        }
    }
}

/// Snapshot persistence configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("hydro")
}

fn default_weather_base_url() -> String {
    "http://api.openweathermap.org".into()
}

fn default_api_key_env() -> String {
    "OPENWEATHERMAP_API_KEY".into()
}

fn default_food_base_url() -> String {
    "https://world.openfoodfacts.org".into()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_fallback_celsius() -> f64 {
    20.0
}

fn default_persistence_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("hydro").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.weather.timeout_secs == 0 || self.food.timeout_secs == 0 {
            return Err(Error::Config("lookup timeouts must be at least 1 second".into()));
        }
        if !self.weather.fallback_celsius.is_finite() {
            return Err(Error::Config("weather.fallback_celsius must be finite".into()));
        }
        if let Some((name, _)) = self
            .food
            .local
            .iter()
            .find(|(_, kcal)| !kcal.is_finite() || **kcal < 0.0)
        {
            return Err(Error::Config(format!(
                "food.local entry {:?} must be a non-negative number",
                name
            )));
        }
        Ok(())
    }
}
