//! Current weather lookups
//!
//! Field forms record conditions at the visit location. The handler only
//! needs the five values in [`WeatherReport`].

mod openweather;

pub use openweather::OpenWeatherClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Current conditions at a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Degrees in the configured unit system
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    pub description: String,
    pub wind_speed: f64,
    pub feels_like: f64,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lng: f64) -> Result<WeatherReport, AppError>;
}

/// Parse and range-check a coordinate pair from raw query values
///
/// Missing or blank values are a validation error.
pub fn parse_coordinates(lat: Option<&str>, lng: Option<&str>) -> Result<(f64, f64), AppError> {
    let (Some(lat), Some(lng)) = (
        lat.map(str::trim).filter(|v| !v.is_empty()),
        lng.map(str::trim).filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Missing coordinates: lat and lng are required".to_string(),
        ));
    };

    let lat = lat
        .parse::<f64>()
        .map_err(|_| AppError::Validation("lat must be a number".to_string()))?;
    let lng = lng
        .parse::<f64>()
        .map_err(|_| AppError::Validation("lng must be a number".to_string()))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation(
            "Coordinates out of range".to_string(),
        ));
    }

    Ok((lat, lng))
}
