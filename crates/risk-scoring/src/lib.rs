//! Rule-Based Coastal Risk Scoring
//!
//! Maps an environmental snapshot to a threat level, a confidence value, a
//! list of human-readable risk factors, and a 72-hour prediction sequence.
//!
//! This is an auditable rule table, not a statistical model. The thresholds
//! and increments are fixed contract values: downstream alerting and the
//! materialization gate are calibrated against them.

pub mod forecast;
pub mod scorer;

pub use forecast::{predict, Prediction};
pub use scorer::{score, RiskAssessment};

use coastal_domain::ThreatType;

/// Classify a threat type from factor text, first match wins.
///
/// Check order is significant: a storm snapshot usually also trips tide
/// factors, and it must classify as storm surge, not flooding.
pub fn classify_threat_type(factors: &[String]) -> ThreatType {
    let joined = factors.join(" ").to_ascii_lowercase();
    if joined.contains("storm") || joined.contains("wind") {
        ThreatType::StormSurge
    } else if joined.contains("tide") || joined.contains("flood") {
        ThreatType::CoastalFlooding
    } else if joined.contains("erosion") {
        ThreatType::Erosion
    } else if joined.contains("pollution") {
        ThreatType::Pollution
    } else {
        ThreatType::EnvironmentalStress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_matches_before_tide() {
        let factors = vec![
            "extreme tide level 2.8 m, coastal flooding possible".to_string(),
            "high wind speed 30 m/s".to_string(),
        ];
        assert_eq!(classify_threat_type(&factors), ThreatType::StormSurge);
    }

    #[test]
    fn test_tide_without_wind_is_flooding() {
        let factors = vec!["rising tide at 2.2 m approaching flood stage".to_string()];
        assert_eq!(classify_threat_type(&factors), ThreatType::CoastalFlooding);
    }

    #[test]
    fn test_erosion_then_pollution() {
        let erosion = vec!["shoreline retreat 1.8 m since baseline, active erosion".to_string()];
        assert_eq!(classify_threat_type(&erosion), ThreatType::Erosion);

        let pollution = vec!["elevated turbidity index 0.81, possible pollution plume".to_string()];
        assert_eq!(classify_threat_type(&pollution), ThreatType::Pollution);
    }

    #[test]
    fn test_unmatched_factors_fall_through() {
        let factors = vec!["chlorophyll 48 mg/m3, algal bloom indicator".to_string()];
        assert_eq!(
            classify_threat_type(&factors),
            ThreatType::EnvironmentalStress
        );
    }
}
