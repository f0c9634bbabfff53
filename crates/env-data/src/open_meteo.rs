//! Live Open-Meteo feed (free, no API key).
//!
//! Weather comes from the forecast endpoint; sea state from the marine
//! endpoint. The marine call is best-effort: if it fails the snapshot still
//! carries weather, just without a tide source. Satellite-derived indices
//! have no live source here and stay `None` - the scorer's confidence model
//! accounts for missing sources.

use crate::{DataError, EnvDataProvider, Result};
use async_trait::async_trait;
use coastal_domain::{
    EnvironmentalSnapshot, MonitoredLocation, TideObservation, TideTrend, WeatherObservation,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

const FORECAST_BASE: &str = "https://api.open-meteo.com/v1/forecast";
const MARINE_BASE: &str = "https://marine-api.open-meteo.com/v1/marine";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: ForecastCurrent,
}

#[derive(Debug, Deserialize)]
struct ForecastCurrent {
    #[serde(default)]
    wind_speed_10m: f64,
    #[serde(default)]
    surface_pressure: f64,
    #[serde(default)]
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: f64,
    #[serde(default)]
    precipitation: f64,
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    current: MarineCurrent,
}

#[derive(Debug, Deserialize)]
struct MarineCurrent {
    #[serde(default)]
    wave_height: f64,
    #[serde(default)]
    sea_level_height_msl: Option<f64>,
}

/// Open-Meteo client with request timeout.
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    forecast_base: String,
    marine_base: String,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static config");
        Self {
            client,
            forecast_base: FORECAST_BASE.to_string(),
            marine_base: MARINE_BASE.to_string(),
        }
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<ForecastCurrent> {
        let url = format!(
            "{}?latitude={:.4}&longitude={:.4}&current=wind_speed_10m,surface_pressure,temperature_2m,relative_humidity_2m,precipitation&wind_speed_unit=ms&timezone=auto",
            self.forecast_base, lat, lon
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::ApiError(format!(
                "Open-Meteo forecast returned status {}",
                response.status()
            )));
        }

        let data: ForecastResponse = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;
        Ok(data.current)
    }

    async fn fetch_marine(&self, lat: f64, lon: f64) -> Result<MarineCurrent> {
        let url = format!(
            "{}?latitude={:.4}&longitude={:.4}&current=wave_height,sea_level_height_msl&timezone=auto",
            self.marine_base, lat, lon
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::ApiError(format!(
                "Open-Meteo marine returned status {}",
                response.status()
            )));
        }

        let data: MarineResponse = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;
        Ok(data.current)
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnvDataProvider for OpenMeteoProvider {
    async fn fetch(&self, location: &MonitoredLocation) -> Result<EnvironmentalSnapshot> {
        let (lat, lon) = (location.latitude_deg, location.longitude_deg);
        let current = self.fetch_forecast(lat, lon).await?;

        // Marine data is a nice-to-have; a missing tide source just lowers
        // the scorer's confidence.
        let marine = match self.fetch_marine(lat, lon).await {
            Ok(marine) => Some(marine),
            Err(e) => {
                debug!(location = %location.name, error = %e, "marine fetch failed");
                None
            }
        };

        let wave_height_m = marine.as_ref().map(|m| m.wave_height).unwrap_or(0.0);
        let tide = marine.and_then(|m| {
            m.sea_level_height_msl.map(|height_m| TideObservation {
                height_m,
                surge_m: 0.0,
                trend: TideTrend::Steady,
            })
        });

        Ok(EnvironmentalSnapshot {
            location_id: location.id,
            captured_at: Utc::now(),
            weather: Some(WeatherObservation {
                wind_speed_ms: current.wind_speed_10m,
                pressure_hpa: current.surface_pressure,
                temperature_c: current.temperature_2m,
                humidity_pct: current.relative_humidity_2m,
                precipitation_mm: current.precipitation,
                wave_height_m,
            }),
            tide,
            satellite: None,
        })
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }
}
