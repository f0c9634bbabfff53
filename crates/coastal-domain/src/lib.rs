//! Coastal Domain Model
//!
//! Shared record types for the CoastWatch monitoring pipeline:
//! monitored locations, threats, impact estimates, alerts, recipients,
//! and the ephemeral environmental snapshot bundle.
//!
//! This crate holds types only: no I/O, no scoring logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("unrecognized threat level: {0}")]
    UnknownThreatLevel(String),
    #[error("unrecognized threat type: {0}")]
    UnknownThreatType(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

// ============================================================================
// Threat classification
// ============================================================================

/// Coarse ordinal risk label assigned by the risk scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// Default severity on the 0-10 scale for a freshly materialized threat.
    ///
    /// High sits above the 7.0 all-recipients fan-out threshold; Medium and
    /// Low sit below it.
    pub fn base_severity(&self) -> f64 {
        match self {
            ThreatLevel::Low => 2.5,
            ThreatLevel::Medium => 5.5,
            ThreatLevel::High => 8.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThreatLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ThreatLevel::Low),
            "medium" => Ok(ThreatLevel::Medium),
            "high" => Ok(ThreatLevel::High),
            other => Err(DomainError::UnknownThreatLevel(other.to_string())),
        }
    }
}

/// Category of coastal hazard a threat record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    StormSurge,
    Erosion,
    Pollution,
    CoastalFlooding,
    AlgalBloom,
    IllegalDumping,
    EnvironmentalStress,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatType::StormSurge => "storm_surge",
            ThreatType::Erosion => "erosion",
            ThreatType::Pollution => "pollution",
            ThreatType::CoastalFlooding => "coastal_flooding",
            ThreatType::AlgalBloom => "algal_bloom",
            ThreatType::IllegalDumping => "illegal_dumping",
            ThreatType::EnvironmentalStress => "environmental_stress",
        }
    }
}

impl std::fmt::Display for ThreatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a threat record entered the system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Manual,
    AutomatedMonitoring,
    UserReport,
    ExternalApi,
    SimulatedData,
}

// ============================================================================
// Stakeholders and alert delivery
// ============================================================================

/// Stakeholder roles eligible to receive alerts.
///
/// The set is closed on purpose: the alert template table matches on it
/// exhaustively, so adding a role forces a decision about its template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StakeholderRole {
    EmergencyManagement,
    CityGovernment,
    EnvironmentalNgo,
    Fisherfolk,
    CivilDefence,
    CoastalResident,
    Researcher,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Sms,
    Webhook,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

/// Alert urgency bucket derived from threat severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl AlertPriority {
    /// Bucket a 0-10 severity score.
    pub fn from_severity(severity: f64) -> Self {
        if severity > 7.0 {
            AlertPriority::Urgent
        } else if severity > 5.0 {
            AlertPriority::High
        } else if severity > 3.0 {
            AlertPriority::Medium
        } else {
            AlertPriority::Low
        }
    }
}

// ============================================================================
// Environmental observations
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TideTrend {
    Rising,
    Falling,
    Steady,
}

/// Weather readings for one location at one capture instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherObservation {
    pub wind_speed_ms: f64,
    pub pressure_hpa: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub wave_height_m: f64,
}

/// Tide gauge readings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TideObservation {
    pub height_m: f64,
    pub surge_m: f64,
    pub trend: TideTrend,
}

/// Derived satellite indices for water quality and shoreline drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SatelliteObservation {
    /// Water turbidity index (0-1, higher = murkier).
    pub turbidity_index: f64,
    /// Chlorophyll-a concentration, mg/m3 (bloom proxy).
    pub chlorophyll_mg_m3: f64,
    /// Shoreline position change since baseline, meters (negative = retreat).
    pub shoreline_change_m: f64,
}

/// Per-location, per-scan bundle of environmental readings.
///
/// Ephemeral: held long enough to feed the risk scorer and optionally sit in
/// the time-bounded snapshot cache. Never persisted as a record of its own,
/// though a JSON copy may be attached to a threat for auditability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalSnapshot {
    pub location_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub weather: Option<WeatherObservation>,
    pub tide: Option<TideObservation>,
    pub satellite: Option<SatelliteObservation>,
}

impl EnvironmentalSnapshot {
    /// Number of data sources present (weather, tide, satellite).
    pub fn source_count(&self) -> usize {
        [
            self.weather.is_some(),
            self.tide.is_some(),
            self.satellite.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

// ============================================================================
// Persisted records
// ============================================================================

/// A coastal site under periodic observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredLocation {
    pub id: Uuid,
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub active: bool,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub last_threat_level: Option<ThreatLevel>,
    pub last_confidence: Option<f64>,
}

impl MonitoredLocation {
    pub fn new(name: &str, latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            latitude_deg,
            longitude_deg,
            active: true,
            last_scanned_at: None,
            last_threat_level: None,
            last_confidence: None,
        }
    }
}

/// A materialized coastal threat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub id: Uuid,
    pub threat_type: ThreatType,
    pub location_id: Uuid,
    pub description: String,
    /// Severity score, 0-10.
    pub severity: f64,
    /// Scorer confidence, 0-1.
    pub confidence: f64,
    pub active: bool,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub provenance: Provenance,
    pub resolution_notes: Option<String>,
    /// Raw scorer input, kept for audit of automated detections.
    pub raw_snapshot: Option<serde_json::Value>,
}

/// Estimated consequences of a threat. Created once per threat, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub id: Uuid,
    pub threat_id: Uuid,
    pub carbon_loss_tons: f64,
    pub economic_loss_usd: f64,
    pub affected_area_km2: f64,
    pub recovery_time: String,
}

/// One delivered (or attempted) notification for one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub threat_id: Uuid,
    pub threat_type: ThreatType,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub channels: Vec<DeliveryChannel>,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A registered alert recipient. Read-only input to the fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
    pub role: StakeholderRole,
    pub active: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub webhook_url: Option<String>,
}
