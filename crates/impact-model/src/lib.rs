//! Impact Estimation
//!
//! Pure lookup from threat level to estimated consequences: a fixed base
//! impact tuple scaled by a per-level multiplier, plus a recovery-time label
//! from a three-bucket table. No measurement feeds in; the point is a stable,
//! auditable figure per level, not a calibrated damage model.

use coastal_domain::ThreatLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImpactError {
    /// The supplied level label is outside the closed low/medium/high set.
    /// A contract violation by the caller, never silently defaulted.
    #[error("invalid threat level: {0}")]
    InvalidThreatLevel(String),
}

pub type Result<T> = std::result::Result<T, ImpactError>;

// ---------------------------------------------------------------------------
// Base impact and multipliers
// ---------------------------------------------------------------------------

/// Base blue-carbon loss for a low-level event, tons.
pub const BASE_CARBON_LOSS_TONS: f64 = 120.0;

/// Base economic loss for a low-level event, USD.
pub const BASE_ECONOMIC_LOSS_USD: f64 = 250_000.0;

/// Base affected coastal area for a low-level event, km2.
pub const BASE_AFFECTED_AREA_KM2: f64 = 1.8;

/// Per-level multipliers, exactly 1 : 2.5 : 5.
pub const MULTIPLIER_LOW: f64 = 1.0;
pub const MULTIPLIER_MEDIUM: f64 = 2.5;
pub const MULTIPLIER_HIGH: f64 = 5.0;

/// Estimated consequences for one threat level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactFigures {
    pub carbon_loss_tons: f64,
    pub economic_loss_usd: f64,
    pub affected_area_km2: f64,
    pub recovery_time: String,
}

fn multiplier_for(level: ThreatLevel) -> f64 {
    match level {
        ThreatLevel::Low => MULTIPLIER_LOW,
        ThreatLevel::Medium => MULTIPLIER_MEDIUM,
        ThreatLevel::High => MULTIPLIER_HIGH,
    }
}

fn recovery_label_for(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::Low => "3-6 months",
        ThreatLevel::Medium => "1-2 years",
        ThreatLevel::High => "3-5 years",
    }
}

/// Estimate the impact for a threat level. Total over the closed enum.
pub fn estimate(level: ThreatLevel) -> ImpactFigures {
    let multiplier = multiplier_for(level);
    ImpactFigures {
        carbon_loss_tons: BASE_CARBON_LOSS_TONS * multiplier,
        economic_loss_usd: BASE_ECONOMIC_LOSS_USD * multiplier,
        affected_area_km2: BASE_AFFECTED_AREA_KM2 * multiplier,
        recovery_time: recovery_label_for(level).to_string(),
    }
}

/// Estimate from an external level label.
///
/// Unrecognized labels fail with `InvalidThreatLevel`: the table is not
/// allowed to silently default for inputs outside its contract.
pub fn estimate_for_label(label: &str) -> Result<ImpactFigures> {
    let level: ThreatLevel = label
        .parse()
        .map_err(|_| ImpactError::InvalidThreatLevel(label.to_string()))?;
    Ok(estimate(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_is_pure() {
        for level in [ThreatLevel::Low, ThreatLevel::Medium, ThreatLevel::High] {
            assert_eq!(estimate(level), estimate(level));
        }
    }

    #[test]
    fn test_multiplier_ratios_are_exact() {
        let low = estimate(ThreatLevel::Low);
        let medium = estimate(ThreatLevel::Medium);
        let high = estimate(ThreatLevel::High);

        assert_eq!(medium.carbon_loss_tons / low.carbon_loss_tons, 2.5);
        assert_eq!(high.carbon_loss_tons / low.carbon_loss_tons, 5.0);
        assert_eq!(medium.economic_loss_usd / low.economic_loss_usd, 2.5);
        assert_eq!(high.economic_loss_usd / low.economic_loss_usd, 5.0);
        assert_eq!(medium.affected_area_km2 / low.affected_area_km2, 2.5);
        assert_eq!(high.affected_area_km2 / low.affected_area_km2, 5.0);
    }

    #[test]
    fn test_recovery_labels_by_level() {
        assert_eq!(estimate(ThreatLevel::Low).recovery_time, "3-6 months");
        assert_eq!(estimate(ThreatLevel::Medium).recovery_time, "1-2 years");
        assert_eq!(estimate(ThreatLevel::High).recovery_time, "3-5 years");
    }

    #[test]
    fn test_label_parsing_accepts_known_levels() {
        let figures = estimate_for_label("high").unwrap();
        assert_eq!(figures.carbon_loss_tons, BASE_CARBON_LOSS_TONS * 5.0);
    }

    #[test]
    fn test_unknown_label_fails_not_defaults() {
        let err = estimate_for_label("apocalyptic").unwrap_err();
        assert_eq!(
            err,
            ImpactError::InvalidThreatLevel("apocalyptic".to_string())
        );
    }
}
