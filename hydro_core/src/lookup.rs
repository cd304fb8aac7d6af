//! Weather and nutrition lookups.
//!
//! Both collaborators sit behind narrow traits. HTTP clients are built with a
//! hard timeout; [`Lookups`] turns every failure into the documented fallback
//! so a slow or broken service never leaves a session half-updated.

use crate::config::{FoodConfig, WeatherConfig};
use crate::{Error, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Current temperature for a city, in degrees Celsius
pub trait WeatherService: Send + Sync {
    fn current_temperature(&self, city: &str) -> Result<f64>;
}

/// Energy density of a food, in kcal per 100 g (0 when nothing matched)
pub trait FoodService: Send + Sync {
    fn calories_per_100g(&self, food_name: &str) -> Result<f64>;
}

// ============================================================================
// Fallback wrapper
// ============================================================================

/// Both collaborators plus the fallback policy
#[derive(Clone)]
pub struct Lookups {
    weather: Arc<dyn WeatherService>,
    food: Arc<dyn FoodService>,
    fallback_celsius: f64,
}

impl Lookups {
    pub fn new(
        weather: Arc<dyn WeatherService>,
        food: Arc<dyn FoodService>,
        fallback_celsius: f64,
    ) -> Self {
        Self {
            weather,
            food,
            fallback_celsius,
        }
    }

    /// HTTP-backed lookups from configuration
    pub fn http(weather: &WeatherConfig, food: &FoodConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(OpenWeatherMap::from_config(weather)?),
            Arc::new(OpenFoodFacts::from_config(food)?),
            weather.fallback_celsius,
        ))
    }

    /// Network-free lookups: fixed temperature and the configured local food table
    pub fn offline(weather: &WeatherConfig, food: &FoodConfig) -> Self {
        Self::new(
            Arc::new(FixedTemperature(weather.fallback_celsius)),
            Arc::new(LocalFoodTable::new(food.local.clone())),
            weather.fallback_celsius,
        )
    }

    /// Temperature for the city, or the fallback on any failure
    pub fn temperature_or_fallback(&self, city: &str) -> f64 {
        match self.weather.current_temperature(city) {
            Ok(t) if t.is_finite() => t,
            Ok(t) => {
                tracing::warn!(
                    "Weather lookup for {:?} returned {}, using {} C",
                    city,
                    t,
                    self.fallback_celsius
                );
                self.fallback_celsius
            }
            Err(e) => {
                tracing::warn!(
                    "Weather lookup for {:?} failed: {}. Using {} C",
                    city,
                    e,
                    self.fallback_celsius
                );
                self.fallback_celsius
            }
        }
    }

    /// Energy density for the food, or 0 on any failure
    pub fn calories_or_zero(&self, food_name: &str) -> f64 {
        match self.food.calories_per_100g(food_name) {
            Ok(kcal) if kcal.is_finite() => kcal,
            Ok(_) => 0.0,
            Err(e) => {
                tracing::warn!("Food lookup for {:?} failed: {}", food_name, e);
                0.0
            }
        }
    }
}

// ============================================================================
// HTTP implementations
// ============================================================================

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config(format!("failed building HTTP client: {e}")))
}

fn unavailable(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::CollaboratorUnavailable(format!("timed out: {e}"))
    } else {
        Error::CollaboratorUnavailable(e.to_string())
    }
}

/// OpenWeatherMap current-weather endpoint
pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

impl OpenWeatherMap {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Reads the API key from the environment variable named in config
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; weather lookups will use the fallback temperature",
                config.api_key_env
            );
        }
        Self::new(config.base_url.clone(), api_key, config.timeout_secs)
    }
}

impl WeatherService for OpenWeatherMap {
    fn current_temperature(&self, city: &str) -> Result<f64> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::CollaboratorUnavailable("no weather API key".into()))?;

        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "weather service returned {status}"
            )));
        }

        let body: WeatherResponse = response.json().map_err(unavailable)?;
        tracing::debug!("Temperature in {:?}: {} C", city, body.main.temp);
        Ok(body.main.temp)
    }
}

/// Open Food Facts product search
pub struct OpenFoodFacts {
    client: Client,
    base_url: String,
}

impl OpenFoodFacts {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &FoodConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout_secs)
    }
}

impl FoodService for OpenFoodFacts {
    fn calories_per_100g(&self, food_name: &str) -> Result<f64> {
        let url = format!("{}/cgi/search.pl", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", food_name),
                ("search_simple", "1"),
                ("json", "1"),
            ])
            .send()
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "food service returned {status}"
            )));
        }

        let body: Value = response.json().map_err(unavailable)?;
        Ok(energy_from_search(&body))
    }
}

/// `products[0].nutriments["energy-kcal_100g"]`, 0 if absent
fn energy_from_search(body: &Value) -> f64 {
    let energy = body
        .get("products")
        .and_then(Value::as_array)
        .and_then(|products| products.first())
        .and_then(|product| product.get("nutriments"))
        .and_then(|nutriments| nutriments.get("energy-kcal_100g"));

    match energy {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// ============================================================================
// Offline implementations
// ============================================================================

/// Always reports the same temperature
#[derive(Clone, Copy, Debug)]
pub struct FixedTemperature(pub f64);

impl WeatherService for FixedTemperature {
    fn current_temperature(&self, _city: &str) -> Result<f64> {
        Ok(self.0)
    }
}

/// Case-insensitive in-memory nutrition table
#[derive(Clone, Debug, Default)]
pub struct LocalFoodTable {
    entries: HashMap<String, f64>,
}

impl LocalFoodTable {
    pub fn new(entries: HashMap<String, f64>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, kcal)| (name.trim().to_lowercase(), kcal))
                .collect(),
        }
    }
}

impl FoodService for LocalFoodTable {
    fn calories_per_100g(&self, food_name: &str) -> Result<f64> {
        Ok(self
            .entries
            .get(&food_name.trim().to_lowercase())
            .copied()
            .unwrap_or(0.0))
    }
}
