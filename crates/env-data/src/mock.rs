//! Deterministic mock data generator.
//!
//! Shapes readings from latitude and time of day so demo dashboards look
//! plausible without a live feed. The optional jitter is the only randomness
//! in the pipeline: the scorer downstream stays pure.

use crate::cache::{Clock, SystemClock};
use crate::{EnvDataProvider, Result};
use async_trait::async_trait;
use coastal_domain::{
    EnvironmentalSnapshot, MonitoredLocation, SatelliteObservation, TideObservation, TideTrend,
    WeatherObservation,
};
use chrono::Timelike;
use rand::Rng;
use std::sync::Arc;

/// Mock environmental feed covering all three data sources.
pub struct MockEnvProvider {
    storm_bias: bool,
    /// Scale of random perturbation (0.0 = fully deterministic).
    jitter: f64,
    clock: Arc<dyn Clock>,
}

impl MockEnvProvider {
    /// Calm-sea conditions, no randomness. Scores come out `low`.
    pub fn calm() -> Self {
        Self {
            storm_bias: false,
            jitter: 0.0,
            clock: Arc::new(SystemClock),
        }
    }

    /// Storm conditions, no randomness: high wind, low pressure, extreme
    /// rising tide. Scores come out `high` and pass the materialization gate.
    pub fn storm() -> Self {
        Self {
            storm_bias: true,
            jitter: 0.0,
            clock: Arc::new(SystemClock),
        }
    }

    /// Calm baseline with mild jitter, for lively demo dashboards.
    pub fn demo() -> Self {
        Self {
            storm_bias: false,
            jitter: 1.0,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn perturb(&self, value: f64, scale: f64) -> f64 {
        if self.jitter == 0.0 {
            return value;
        }
        let mut rng = rand::thread_rng();
        value + rng.gen_range(-1.0..=1.0) * scale * self.jitter
    }

    fn generate(&self, location: &MonitoredLocation) -> EnvironmentalSnapshot {
        let now = self.clock.now();
        let abs_lat = location.latitude_deg.abs();

        // Tropical coasts run warmer, wetter, and closer to monsoon baselines.
        let (wind_base, precip_base): (f64, f64) = if abs_lat < 15.0 {
            (8.0, 6.0)
        } else if abs_lat < 35.0 {
            (6.0, 2.0)
        } else {
            (9.0, 4.0)
        };

        // Diurnal swing keyed off local solar time, as a stand-in for the
        // sea-breeze cycle.
        let local_hour = (now.hour() as f64 + location.longitude_deg / 15.0).rem_euclid(24.0);
        let diurnal = (local_hour / 24.0 * std::f64::consts::TAU).sin();

        let weather = if self.storm_bias {
            WeatherObservation {
                wind_speed_ms: self.perturb(30.0, 3.0),
                pressure_hpa: self.perturb(995.0, 2.0),
                temperature_c: self.perturb(27.0, 1.0),
                humidity_pct: self.perturb(92.0, 3.0),
                precipitation_mm: self.perturb(80.0, 10.0),
                wave_height_m: self.perturb(4.2, 0.4),
            }
        } else {
            WeatherObservation {
                wind_speed_ms: self.perturb(wind_base + diurnal * 3.0, 1.5),
                pressure_hpa: self.perturb(1012.0 - diurnal * 3.0, 1.0),
                temperature_c: self.perturb(30.0 - abs_lat * 0.3 + diurnal * 2.0, 0.5),
                humidity_pct: self.perturb(70.0 + diurnal * 8.0, 4.0),
                precipitation_mm: self.perturb(precip_base.max(0.0), 1.0),
                wave_height_m: self.perturb(0.8 + diurnal.abs() * 0.4, 0.2),
            }
        };

        let tide = if self.storm_bias {
            TideObservation {
                height_m: self.perturb(2.8, 0.1),
                surge_m: self.perturb(0.9, 0.1),
                trend: TideTrend::Rising,
            }
        } else {
            // Semi-diurnal tide approximated by a 12-hour cycle.
            let tide_phase = (local_hour / 12.0 * std::f64::consts::TAU).sin();
            TideObservation {
                height_m: self.perturb(1.1 + tide_phase * 0.7, 0.1),
                surge_m: self.perturb(0.05, 0.05),
                trend: if tide_phase > 0.2 {
                    TideTrend::Rising
                } else if tide_phase < -0.2 {
                    TideTrend::Falling
                } else {
                    TideTrend::Steady
                },
            }
        };

        let satellite = SatelliteObservation {
            turbidity_index: self.perturb(if self.storm_bias { 0.55 } else { 0.25 }, 0.05),
            chlorophyll_mg_m3: self.perturb(if self.storm_bias { 22.0 } else { 15.0 }, 3.0),
            shoreline_change_m: self.perturb(if self.storm_bias { -0.9 } else { -0.2 }, 0.1),
        };

        EnvironmentalSnapshot {
            location_id: location.id,
            captured_at: now,
            weather: Some(weather),
            tide: Some(tide),
            satellite: Some(satellite),
        }
    }
}

#[async_trait]
impl EnvDataProvider for MockEnvProvider {
    async fn fetch(&self, location: &MonitoredLocation) -> Result<EnvironmentalSnapshot> {
        Ok(self.generate(location))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
