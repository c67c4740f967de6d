//! Weather proxy endpoint
//!
//! Public: the provider key stays on the server.

use axum::{
    extract::{Query, State},
    response::Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::weather::{WeatherReport, parse_coordinates};

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

/// GET /api/weather?lat=..&lng=..
pub async fn current_weather(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<WeatherQuery>, AppError>,
) -> Result<Json<WeatherReport>, AppError> {
    let (lat, lng) = parse_coordinates(query.lat.as_deref(), query.lng.as_deref())?;

    let report = state
        .weather
        .current(lat, lng)
        .await
        .map_err(|error| match error {
            AppError::Config(_) | AppError::Upstream(_) => error,
            other => AppError::Upstream(format!("Weather lookup failed: {other}")),
        })?;

    Ok(Json(report))
}
