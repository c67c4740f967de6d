//! OpenWeatherMap current weather client

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::{WeatherProvider, WeatherReport};
use crate::config::WeatherConfig;
use crate::error::AppError;
use crate::metrics::UPSTREAM_REQUEST_DURATION_SECONDS;

pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    units: String,
    lang: String,
}

impl OpenWeatherClient {
    pub fn new(http: reqwest::Client, config: &WeatherConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToOwned::to_owned),
            units: config.units.clone(),
            lang: config.lang.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

impl From<CurrentWeather> for WeatherReport {
    fn from(current: CurrentWeather) -> Self {
        WeatherReport {
            temperature: current.main.temp,
            humidity: current.main.humidity,
            description: current
                .weather
                .into_iter()
                .next()
                .map(|condition| condition.description)
                .unwrap_or_default(),
            wind_speed: current.wind.map(|wind| wind.speed).unwrap_or_default(),
            feels_like: current.main.feels_like,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, lat: f64, lng: f64) -> Result<WeatherReport, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Weather API key is not configured".to_string()))?;

        let started = Instant::now();
        let response = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", api_key.to_string()),
                ("units", self.units.clone()),
                ("lang", self.lang.clone()),
            ])
            .send()
            .await;
        UPSTREAM_REQUEST_DURATION_SECONDS
            .with_label_values(&["weather"])
            .observe(started.elapsed().as_secs_f64());
        let response = response?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "Weather provider request failed");
            return Err(AppError::Upstream(format!(
                "Weather provider request failed ({status})"
            )));
        }

        let current = response
            .json::<CurrentWeather>()
            .await
            .map_err(|e| AppError::Upstream(format!("Unexpected weather response: {e}")))?;

        Ok(current.into())
    }
}
