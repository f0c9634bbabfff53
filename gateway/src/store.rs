//! In-memory record store.
//!
//! The pipeline treats persistence as an external collaborator with
//! per-record atomic writes and no cross-record transactions. This
//! implementation keeps each record family in its own `RwLock<HashMap>`,
//! which gives exactly those semantics in-process.

use chrono::{DateTime, Utc};
use coastal_domain::{
    AlertRecord, DeliveryStatus, ImpactEstimate, MonitoredLocation, Recipient, ThreatLevel,
    ThreatRecord,
};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },
    /// Write rejected because it would violate a record invariant.
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// All record families behind independent locks.
#[derive(Default)]
pub struct Store {
    locations: RwLock<HashMap<Uuid, MonitoredLocation>>,
    threats: RwLock<HashMap<Uuid, ThreatRecord>>,
    impacts: RwLock<HashMap<Uuid, ImpactEstimate>>,
    alerts: RwLock<HashMap<Uuid, AlertRecord>>,
    recipients: RwLock<HashMap<Uuid, Recipient>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Locations
    // ------------------------------------------------------------------

    pub async fn insert_location(&self, location: MonitoredLocation) {
        self.locations.write().await.insert(location.id, location);
    }

    pub async fn location(&self, id: Uuid) -> Result<MonitoredLocation> {
        self.locations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: "location",
                id,
            })
    }

    /// Active locations in stable name order, so sweep order is predictable.
    pub async fn active_locations(&self) -> Vec<MonitoredLocation> {
        let mut locations: Vec<_> = self
            .locations
            .read()
            .await
            .values()
            .filter(|l| l.active)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations
    }

    /// Record the outcome of a completed scan on the location.
    pub async fn record_scan(
        &self,
        id: Uuid,
        level: ThreatLevel,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut locations = self.locations.write().await;
        let location = locations.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "location",
            id,
        })?;
        location.last_scanned_at = Some(at);
        location.last_threat_level = Some(level);
        location.last_confidence = Some(confidence);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Threats
    // ------------------------------------------------------------------

    pub async fn insert_threat(&self, threat: ThreatRecord) -> Result<()> {
        let mut threats = self.threats.write().await;
        if threats.contains_key(&threat.id) {
            return Err(StoreError::Conflict(format!(
                "threat {} already exists",
                threat.id
            )));
        }
        threats.insert(threat.id, threat);
        Ok(())
    }

    pub async fn threat(&self, id: Uuid) -> Result<ThreatRecord> {
        self.threats
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { kind: "threat", id })
    }

    /// Threats newest first, optionally restricted to active ones.
    pub async fn threats(&self, active_only: bool) -> Vec<ThreatRecord> {
        let mut threats: Vec<_> = self
            .threats
            .read()
            .await
            .values()
            .filter(|t| !active_only || t.active)
            .cloned()
            .collect();
        threats.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        threats
    }

    pub async fn threats_for_location(&self, location_id: Uuid) -> Vec<ThreatRecord> {
        self.threats
            .read()
            .await
            .values()
            .filter(|t| t.location_id == location_id)
            .cloned()
            .collect()
    }

    /// Flip a threat inactive and stamp the resolution. Threats are never
    /// hard-deleted on the automated path.
    pub async fn resolve_threat(&self, id: Uuid, notes: Option<String>) -> Result<ThreatRecord> {
        let mut threats = self.threats.write().await;
        let threat = threats
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "threat", id })?;
        threat.active = false;
        threat.resolved_at = Some(Utc::now());
        threat.resolution_notes = notes;
        Ok(threat.clone())
    }

    // ------------------------------------------------------------------
    // Impact estimates
    // ------------------------------------------------------------------

    /// A threat has at most one impact estimate; a second write conflicts.
    pub async fn insert_impact(&self, impact: ImpactEstimate) -> Result<()> {
        let mut impacts = self.impacts.write().await;
        if impacts.values().any(|i| i.threat_id == impact.threat_id) {
            return Err(StoreError::Conflict(format!(
                "impact estimate for threat {} already exists",
                impact.threat_id
            )));
        }
        impacts.insert(impact.id, impact);
        Ok(())
    }

    pub async fn impact_for_threat(&self, threat_id: Uuid) -> Option<ImpactEstimate> {
        self.impacts
            .read()
            .await
            .values()
            .find(|i| i.threat_id == threat_id)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    pub async fn insert_alert(&self, alert: AlertRecord) -> Result<()> {
        self.alerts.write().await.insert(alert.id, alert);
        Ok(())
    }

    pub async fn set_alert_status(&self, id: Uuid, status: DeliveryStatus) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "alert", id })?;
        alert.status = status;
        Ok(())
    }

    pub async fn alerts_for_recipient(&self, recipient_id: Uuid) -> Vec<AlertRecord> {
        let mut alerts: Vec<_> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.recipient_id == recipient_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }

    pub async fn alerts_for_threat(&self, threat_id: Uuid) -> Vec<AlertRecord> {
        self.alerts
            .read()
            .await
            .values()
            .filter(|a| a.threat_id == threat_id)
            .cloned()
            .collect()
    }

    pub async fn mark_alert_read(&self, id: Uuid) -> Result<AlertRecord> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "alert", id })?;
        alert.status = DeliveryStatus::Read;
        alert.read_at = Some(Utc::now());
        Ok(alert.clone())
    }

    // ------------------------------------------------------------------
    // Recipients
    // ------------------------------------------------------------------

    pub async fn insert_recipient(&self, recipient: Recipient) {
        self.recipients
            .write()
            .await
            .insert(recipient.id, recipient);
    }

    pub async fn active_recipients(&self) -> Vec<Recipient> {
        let mut recipients: Vec<_> = self
            .recipients
            .read()
            .await
            .values()
            .filter(|r| r.active)
            .cloned()
            .collect();
        recipients.sort_by(|a, b| a.name.cmp(&b.name));
        recipients
    }

    pub async fn recipients(&self) -> Vec<Recipient> {
        self.recipients.read().await.values().cloned().collect()
    }
}
