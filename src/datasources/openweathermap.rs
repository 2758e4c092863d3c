use crate::config::OpenWeatherMapConfig;
use crate::error::{HarvestWiseError, Result};
use crate::logic::weather::LiveWeather;
use crate::models::{Coordinates, WeatherSnapshot, WeatherSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch current conditions from OpenWeatherMap (metric units)
    pub async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSnapshot> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            API_BASE_URL, coords.latitude, coords.longitude, self.config.api_key
        );

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                HarvestWiseError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestWiseError::DataSourceUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmCurrentResponse = response.json().await.map_err(|e| {
            HarvestWiseError::DataSourceUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })?;

        Ok(convert_response(owm_response))
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self, coords: Coordinates) -> Result<bool> {
        Ok(self.fetch_current(coords).await.is_ok())
    }
}

#[async_trait]
impl LiveWeather for OpenWeatherMapClient {
    async fn current(&self, coords: Coordinates) -> Result<WeatherSnapshot> {
        self.fetch_current(coords).await
    }
}

fn convert_response(response: OwmCurrentResponse) -> WeatherSnapshot {
    let rainfall_mm = response
        .rain
        .as_ref()
        .and_then(|r| r.one_hour.or(r.three_hour))
        .unwrap_or(0.0);
    let icon = response
        .weather
        .first()
        .map(|w| w.icon.clone())
        .unwrap_or_default();

    WeatherSnapshot {
        temperature_c: response.main.temp,
        humidity_percent: response.main.humidity,
        rainfall_mm,
        icon,
        source: WeatherSource::Live,
        timestamp: DateTime::from_timestamp(response.dt, 0).unwrap_or_else(Utc::now),
    }
}
