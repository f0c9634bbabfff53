//! Forward-looking hourly predictions.
//!
//! Fixed cadence: one step every 6 simulated hours across a 72-hour horizon.
//! Each step's probability starts from a level-dependent initial value and
//! decays linearly as the horizon extends, with early-window boosts when wind
//! or tide thresholds are already exceeded at scoring time.

use crate::scorer::{TIDE_EXTREME_M, WIND_HIGH_MS};
use coastal_domain::{EnvironmentalSnapshot, ThreatLevel};
use serde::{Deserialize, Serialize};

/// Hours between prediction steps.
pub const PREDICTION_STEP_HOURS: u32 = 6;

/// Total prediction horizon.
pub const PREDICTION_HORIZON_HOURS: u32 = 72;

/// Initial probability by current threat level.
const INITIAL_PROBABILITY_LOW: f64 = 0.30;
const INITIAL_PROBABILITY_MEDIUM: f64 = 0.60;
const INITIAL_PROBABILITY_HIGH: f64 = 0.85;

/// Linear decay applied per hour of horizon.
const DECAY_PER_HOUR: f64 = 0.008;

/// Probability is clamped into [floor, cap].
const PROBABILITY_FLOOR: f64 = 0.05;
const PROBABILITY_CAP: f64 = 0.95;

/// Boost while a storm-force wind reading is current, and its window.
const WIND_BOOST: f64 = 0.10;
const WIND_BOOST_WINDOW_HOURS: u32 = 18;

/// Boost while an extreme tide reading is current, and its window.
const TIDE_BOOST: f64 = 0.08;
const TIDE_BOOST_WINDOW_HOURS: u32 = 12;

/// One forward-looking step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub hours_ahead: u32,
    pub probability: f64,
}

/// Build the fixed-cadence prediction sequence for a scored snapshot.
pub fn predict(snapshot: &EnvironmentalSnapshot, level: ThreatLevel) -> Vec<Prediction> {
    let initial = match level {
        ThreatLevel::Low => INITIAL_PROBABILITY_LOW,
        ThreatLevel::Medium => INITIAL_PROBABILITY_MEDIUM,
        ThreatLevel::High => INITIAL_PROBABILITY_HIGH,
    };

    let wind_exceeded = snapshot
        .weather
        .as_ref()
        .is_some_and(|w| w.wind_speed_ms >= WIND_HIGH_MS);
    let tide_exceeded = snapshot
        .tide
        .as_ref()
        .is_some_and(|t| t.height_m >= TIDE_EXTREME_M);

    (1..=PREDICTION_HORIZON_HOURS / PREDICTION_STEP_HOURS)
        .map(|step| {
            let hours_ahead = step * PREDICTION_STEP_HOURS;
            let mut probability = initial - DECAY_PER_HOUR * hours_ahead as f64;
            if wind_exceeded && hours_ahead <= WIND_BOOST_WINDOW_HOURS {
                probability += WIND_BOOST;
            }
            if tide_exceeded && hours_ahead <= TIDE_BOOST_WINDOW_HOURS {
                probability += TIDE_BOOST;
            }
            Prediction {
                hours_ahead,
                probability: probability.clamp(PROBABILITY_FLOOR, PROBABILITY_CAP),
            }
        })
        .collect()
}
