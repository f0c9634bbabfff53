//! Factor extraction, level classification, and confidence.

use crate::forecast::{predict, Prediction};
use coastal_domain::{EnvironmentalSnapshot, ThreatLevel, TideTrend};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Thresholds (fixed contract values)
// ---------------------------------------------------------------------------

/// Sustained wind at or above this is a high-risk indicator, m/s.
pub const WIND_HIGH_MS: f64 = 25.0;

/// Barometric pressure below this indicates storm conditions, hPa.
pub const PRESSURE_STORM_HPA: f64 = 1000.0;

/// Significant wave height at or above this is a high-risk indicator, m.
pub const WAVE_HIGH_M: f64 = 3.0;

/// Tide at or above this is extreme for the monitored coasts, m.
pub const TIDE_EXTREME_M: f64 = 2.5;

/// A rising tide at or above this is approaching flood stage, m.
pub const TIDE_FLOOD_APPROACH_M: f64 = 2.0;

/// 24h rainfall at or above this is a medium-risk indicator, mm.
pub const PRECIP_HEAVY_MM: f64 = 50.0;

/// Shoreline change at or below this marks active erosion, m.
pub const SHORELINE_RETREAT_M: f64 = -1.5;

/// Turbidity index at or above this suggests a pollution plume.
pub const TURBIDITY_POLLUTION: f64 = 0.7;

/// Chlorophyll-a at or above this suggests an algal bloom, mg/m3.
pub const CHLOROPHYLL_BLOOM: f64 = 40.0;

/// Confidence base with no regard to source coverage.
pub const CONFIDENCE_BASE: f64 = 0.5;

/// Confidence increment per data source present (weather, tide, satellite).
pub const CONFIDENCE_PER_SOURCE: f64 = 0.15;

/// Confidence never exceeds this.
pub const CONFIDENCE_CAP: f64 = 0.95;

// ---------------------------------------------------------------------------
// Assessment types
// ---------------------------------------------------------------------------

/// Internal weight class of a single risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FactorWeight {
    Medium,
    High,
}

pub(crate) struct RiskFactor {
    pub weight: FactorWeight,
    pub text: String,
}

/// Output of one scoring pass over one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: ThreatLevel,
    pub confidence: f64,
    pub factors: Vec<String>,
    pub predictions: Vec<Prediction>,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a snapshot. Deterministic: identical snapshots score identically.
pub fn score(snapshot: &EnvironmentalSnapshot) -> RiskAssessment {
    let weighted = extract_factors(snapshot);
    let level = classify_level(&weighted);
    let confidence = confidence_for_sources(snapshot.source_count());
    let predictions = predict(snapshot, level);

    let factors: Vec<String> = weighted.into_iter().map(|f| f.text).collect();
    debug!(
        level = %level,
        confidence,
        factor_count = factors.len(),
        "scored snapshot"
    );

    RiskAssessment {
        level,
        confidence,
        factors,
        predictions,
    }
}

pub(crate) fn extract_factors(snapshot: &EnvironmentalSnapshot) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if let Some(weather) = &snapshot.weather {
        if weather.wind_speed_ms >= WIND_HIGH_MS {
            factors.push(RiskFactor {
                weight: FactorWeight::High,
                text: format!(
                    "high wind speed {:.0} m/s, storm-force conditions",
                    weather.wind_speed_ms
                ),
            });
        }
        if weather.pressure_hpa < PRESSURE_STORM_HPA {
            factors.push(RiskFactor {
                weight: FactorWeight::High,
                text: format!(
                    "low barometric pressure {:.0} hPa, storm system indicated",
                    weather.pressure_hpa
                ),
            });
        }
        if weather.wave_height_m >= WAVE_HIGH_M {
            factors.push(RiskFactor {
                weight: FactorWeight::High,
                text: format!("storm swell, wave height {:.1} m", weather.wave_height_m),
            });
        }
        if weather.precipitation_mm >= PRECIP_HEAVY_MM {
            factors.push(RiskFactor {
                weight: FactorWeight::Medium,
                text: format!(
                    "heavy rainfall {:.0} mm, flash flood risk",
                    weather.precipitation_mm
                ),
            });
        }
    }

    if let Some(tide) = &snapshot.tide {
        if tide.height_m >= TIDE_EXTREME_M {
            factors.push(RiskFactor {
                weight: FactorWeight::High,
                text: format!(
                    "extreme tide level {:.1} m, coastal flooding possible",
                    tide.height_m
                ),
            });
        } else if tide.trend == TideTrend::Rising && tide.height_m >= TIDE_FLOOD_APPROACH_M {
            factors.push(RiskFactor {
                weight: FactorWeight::Medium,
                text: format!(
                    "rising tide at {:.1} m approaching flood stage",
                    tide.height_m
                ),
            });
        }
    }

    if let Some(satellite) = &snapshot.satellite {
        if satellite.shoreline_change_m <= SHORELINE_RETREAT_M {
            factors.push(RiskFactor {
                weight: FactorWeight::Medium,
                text: format!(
                    "shoreline retreat {:.1} m since baseline, active erosion",
                    satellite.shoreline_change_m.abs()
                ),
            });
        }
        if satellite.turbidity_index >= TURBIDITY_POLLUTION {
            factors.push(RiskFactor {
                weight: FactorWeight::Medium,
                text: format!(
                    "elevated turbidity index {:.2}, possible pollution plume",
                    satellite.turbidity_index
                ),
            });
        }
        if satellite.chlorophyll_mg_m3 >= CHLOROPHYLL_BLOOM {
            factors.push(RiskFactor {
                weight: FactorWeight::Medium,
                text: format!(
                    "chlorophyll {:.0} mg/m3, algal bloom indicator",
                    satellite.chlorophyll_mg_m3
                ),
            });
        }
    }

    factors
}

/// Two or more high-risk indicators make a high; one high or two mediums
/// make a medium; anything less is low.
pub(crate) fn classify_level(factors: &[RiskFactor]) -> ThreatLevel {
    let high = factors
        .iter()
        .filter(|f| f.weight == FactorWeight::High)
        .count();
    let medium = factors
        .iter()
        .filter(|f| f.weight == FactorWeight::Medium)
        .count();

    if high >= 2 {
        ThreatLevel::High
    } else if high == 1 || medium >= 2 {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Confidence from data-source coverage alone.
pub fn confidence_for_sources(sources: usize) -> f64 {
    (CONFIDENCE_BASE + CONFIDENCE_PER_SOURCE * sources as f64).min(CONFIDENCE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coastal_domain::{
        SatelliteObservation, TideObservation, WeatherObservation,
    };
    use uuid::Uuid;

    fn empty_snapshot() -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            location_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            weather: None,
            tide: None,
            satellite: None,
        }
    }

    fn calm_weather() -> WeatherObservation {
        WeatherObservation {
            wind_speed_ms: 6.0,
            pressure_hpa: 1013.0,
            temperature_c: 29.0,
            humidity_pct: 70.0,
            precipitation_mm: 2.0,
            wave_height_m: 0.7,
        }
    }

    fn storm_weather() -> WeatherObservation {
        WeatherObservation {
            wind_speed_ms: 30.0,
            pressure_hpa: 995.0,
            temperature_c: 27.0,
            humidity_pct: 92.0,
            precipitation_mm: 10.0,
            wave_height_m: 1.8,
        }
    }

    #[test]
    fn test_no_factors_scores_low() {
        let mut snapshot = empty_snapshot();
        snapshot.weather = Some(calm_weather());
        snapshot.tide = Some(TideObservation {
            height_m: 1.0,
            surge_m: 0.0,
            trend: TideTrend::Steady,
        });

        let assessment = score(&snapshot);
        assert_eq!(assessment.level, ThreatLevel::Low);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_two_high_indicators_score_high() {
        // Wind 30 m/s and pressure 995 hPa: the reference storm scenario.
        let mut snapshot = empty_snapshot();
        snapshot.weather = Some(storm_weather());

        let assessment = score(&snapshot);
        assert_eq!(assessment.level, ThreatLevel::High);
        assert!(assessment.factors.iter().any(|f| f.contains("wind")));
        assert!(assessment.factors.iter().any(|f| f.contains("storm system")));
    }

    #[test]
    fn test_single_high_indicator_scores_medium() {
        let mut snapshot = empty_snapshot();
        let mut weather = calm_weather();
        weather.wind_speed_ms = 26.0;
        snapshot.weather = Some(weather);

        assert_eq!(score(&snapshot).level, ThreatLevel::Medium);
    }

    #[test]
    fn test_two_medium_indicators_score_medium() {
        let mut snapshot = empty_snapshot();
        let mut weather = calm_weather();
        weather.precipitation_mm = 60.0;
        snapshot.weather = Some(weather);
        snapshot.tide = Some(TideObservation {
            height_m: 2.1,
            surge_m: 0.2,
            trend: TideTrend::Rising,
        });

        let assessment = score(&snapshot);
        assert_eq!(assessment.level, ThreatLevel::Medium);
        assert_eq!(assessment.factors.len(), 2);
    }

    #[test]
    fn test_confidence_increments_per_source() {
        assert!((confidence_for_sources(0) - 0.5).abs() < 1e-9);
        assert!((confidence_for_sources(1) - 0.65).abs() < 1e-9);
        assert!((confidence_for_sources(2) - 0.8).abs() < 1e-9);
        assert!((confidence_for_sources(3) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        for sources in 0..8 {
            assert!(confidence_for_sources(sources) <= CONFIDENCE_CAP);
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let mut snapshot = empty_snapshot();
        snapshot.weather = Some(storm_weather());
        snapshot.satellite = Some(SatelliteObservation {
            turbidity_index: 0.8,
            chlorophyll_mg_m3: 45.0,
            shoreline_change_m: -2.0,
        });

        let a = score(&snapshot);
        let b = score(&snapshot);
        assert_eq!(a.level, b.level);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.factors, b.factors);
        assert_eq!(a.predictions.len(), b.predictions.len());
    }

    #[test]
    fn test_satellite_only_factors() {
        let mut snapshot = empty_snapshot();
        snapshot.satellite = Some(SatelliteObservation {
            turbidity_index: 0.85,
            chlorophyll_mg_m3: 50.0,
            shoreline_change_m: -0.1,
        });

        let assessment = score(&snapshot);
        // Two medium indicators: pollution plume and algal bloom.
        assert_eq!(assessment.level, ThreatLevel::Medium);
        assert!((assessment.confidence - 0.65).abs() < 1e-9);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn confidence_monotone_in_source_count(a in 0usize..4, b in 0usize..4) {
                if a <= b {
                    prop_assert!(confidence_for_sources(a) <= confidence_for_sources(b));
                }
            }

            #[test]
            fn level_never_panics_on_arbitrary_weather(
                wind in 0.0f64..80.0,
                pressure in 900.0f64..1060.0,
                precip in 0.0f64..300.0,
                wave in 0.0f64..12.0,
            ) {
                let mut snapshot = empty_snapshot();
                snapshot.weather = Some(WeatherObservation {
                    wind_speed_ms: wind,
                    pressure_hpa: pressure,
                    temperature_c: 28.0,
                    humidity_pct: 75.0,
                    precipitation_mm: precip,
                    wave_height_m: wave,
                });
                let assessment = score(&snapshot);
                prop_assert!(assessment.confidence <= CONFIDENCE_CAP);
                prop_assert!(assessment.confidence >= CONFIDENCE_BASE);
            }
        }
    }
}
