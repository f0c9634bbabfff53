//! Threat scan orchestration.
//!
//! Two independent timers drive the pipeline:
//! - a full sweep over all active locations every 15 minutes, sequential with
//!   a small inter-location delay to respect upstream rate limits;
//! - a lower-frequency synthetic event generator that keeps demos lively.
//!
//! They may overlap freely: the sweep mutates per-location status and the
//! generator only creates brand-new records, so no record is ever written by
//! both. Nothing in here terminates the process; individual-location failures
//! are logged and the timers keep ticking.

use crate::alerts::AlertFanout;
use crate::push::{PushEvent, PushHub};
use crate::store::Store;
use chrono::Utc;
use coastal_domain::{Provenance, ThreatLevel, ThreatRecord, ThreatType};
use env_data::{DataError, EnvDataService};
use risk_scoring::{classify_threat_type, RiskAssessment};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Materialization gate (hard thresholds, not tunables)
// ---------------------------------------------------------------------------

/// Confidence must strictly exceed this for a threat to materialize.
pub const GATE_MIN_CONFIDENCE: f64 = 0.7;

/// At least this many risk factors must be present.
pub const GATE_MIN_FACTORS: usize = 2;

/// The three-condition materialization gate. Exists to prevent alert fatigue
/// from borderline signals.
pub fn gate_passes(level: ThreatLevel, confidence: f64, factor_count: usize) -> bool {
    level >= ThreatLevel::Medium
        && confidence > GATE_MIN_CONFIDENCE
        && factor_count >= GATE_MIN_FACTORS
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Full-sweep cadence.
    pub sweep_interval: Duration,
    /// Pause between locations within one sweep.
    pub inter_location_delay: Duration,
    /// Synthetic generator check cadence.
    pub synthetic_interval: Duration,
    /// Chance the generator fires on each check.
    pub synthetic_probability: f64,
    /// The generator is a demo convenience; production deployments turn it off.
    pub synthetic_enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15 * 60),
            inter_location_delay: Duration::from_secs(2),
            synthetic_interval: Duration::from_secs(5 * 60),
            synthetic_probability: 0.3,
            synthetic_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic source
// ---------------------------------------------------------------------------

/// Threat types the generator draws from.
const SYNTHETIC_TYPES: [ThreatType; 5] = [
    ThreatType::StormSurge,
    ThreatType::CoastalFlooding,
    ThreatType::Pollution,
    ThreatType::AlgalBloom,
    ThreatType::IllegalDumping,
];

/// Generator picks among the first few locations only.
const SYNTHETIC_LOCATION_POOL: usize = 3;

/// One drawn synthetic event, before persistence.
#[derive(Debug, Clone)]
pub struct SyntheticEvent {
    pub location_index: usize,
    pub threat_type: ThreatType,
    pub severity: f64,
    pub confidence: f64,
}

/// Demo event source, isolated behind its own strategy so the orchestrator
/// wiring does not depend on where events come from.
pub struct SyntheticSource {
    probability: f64,
}

impl SyntheticSource {
    pub fn new(probability: f64) -> Self {
        Self { probability }
    }

    /// Draw an event, or None when the dice say not this time.
    pub fn draw(&self, location_count: usize) -> Option<SyntheticEvent> {
        if location_count == 0 {
            return None;
        }
        use rand::Rng;
        let mut rng = rand::thread_rng();
        if rng.gen::<f64>() >= self.probability {
            return None;
        }
        let pool = location_count.min(SYNTHETIC_LOCATION_POOL);
        Some(SyntheticEvent {
            location_index: rng.gen_range(0..pool),
            threat_type: SYNTHETIC_TYPES[rng.gen_range(0..SYNTHETIC_TYPES.len())],
            severity: rng.gen_range(4.0..9.5),
            confidence: rng.gen_range(0.6..0.95),
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct ThreatMonitor {
    store: Arc<Store>,
    push: Arc<PushHub>,
    env: EnvDataService,
    fanout: AlertFanout,
    synthetic: SyntheticSource,
    config: MonitorConfig,
}

impl ThreatMonitor {
    pub fn new(
        store: Arc<Store>,
        push: Arc<PushHub>,
        env: EnvDataService,
        config: MonitorConfig,
    ) -> Arc<Self> {
        let fanout = AlertFanout::new(store.clone(), push.clone());
        let synthetic = SyntheticSource::new(config.synthetic_probability);
        Arc::new(Self {
            store,
            push,
            env,
            fanout,
            synthetic,
            config,
        })
    }

    /// Spawn both timer loops. They run until process shutdown.
    pub fn start(self: &Arc<Self>) {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.sweep_interval);
            loop {
                ticker.tick().await;
                monitor.run_sweep().await;
            }
        });

        if self.config.synthetic_enabled {
            let monitor = self.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(monitor.config.synthetic_interval);
                loop {
                    ticker.tick().await;
                    monitor.run_synthetic().await;
                }
            });
        }

        info!(
            sweep_interval_s = self.config.sweep_interval.as_secs(),
            synthetic = self.config.synthetic_enabled,
            "threat monitor started"
        );
    }

    /// One full pass over the active locations.
    pub async fn run_sweep(&self) {
        let locations = self.store.active_locations().await;
        info!(locations = locations.len(), "starting threat sweep");

        let mut materialized = 0;
        for location in &locations {
            if self.scan_location(location.id).await.is_some() {
                materialized += 1;
            }
            tokio::time::sleep(self.config.inter_location_delay).await;
        }

        let (cached, fresh) = self.env.cache_stats().await;
        debug!(cached, fresh, "snapshot cache after sweep");

        self.push.broadcast(PushEvent::SystemStatus {
            message: format!(
                "sweep complete: {} locations scanned, {} threats materialized",
                locations.len(),
                materialized
            ),
            timestamp: Utc::now(),
        });
    }

    /// Scan one location. Returns the materialized threat, if any.
    ///
    /// A failed fetch skips the location for this cycle: no data is not the
    /// same as no risk, so the last-known status is left untouched.
    pub async fn scan_location(&self, location_id: Uuid) -> Option<ThreatRecord> {
        let location = match self.store.location(location_id).await {
            Ok(location) => location,
            Err(e) => {
                error!(%location_id, error = %e, "scan requested for unknown location");
                return None;
            }
        };

        let snapshot = match self.env.fetch(&location).await {
            Ok(snapshot) => snapshot,
            Err(e @ DataError::DataUnavailable { .. }) => {
                warn!(location = %location.name, error = %e, "skipping location this cycle");
                return None;
            }
            Err(e) => {
                warn!(location = %location.name, error = %e, "data fetch failed, skipping");
                return None;
            }
        };

        let assessment = risk_scoring::score(&snapshot);
        let threat = if gate_passes(
            assessment.level,
            assessment.confidence,
            assessment.factors.len(),
        ) {
            self.materialize(&location.name, location_id, &snapshot, &assessment)
                .await
        } else {
            debug!(
                location = %location.name,
                level = %assessment.level,
                confidence = assessment.confidence,
                factors = assessment.factors.len(),
                "below materialization gate"
            );
            None
        };

        // The location's last-known status reflects every completed scan,
        // gate outcome notwithstanding.
        if let Err(e) = self
            .store
            .record_scan(
                location_id,
                assessment.level,
                assessment.confidence,
                Utc::now(),
            )
            .await
        {
            error!(location = %location.name, error = %e, "failed to update scan status");
        }

        threat
    }

    /// Persist the threat and its impact estimate, then notify.
    ///
    /// A persistence failure aborts this location's materialization for the
    /// cycle; the sweep itself continues.
    async fn materialize(
        &self,
        location_name: &str,
        location_id: Uuid,
        snapshot: &coastal_domain::EnvironmentalSnapshot,
        assessment: &RiskAssessment,
    ) -> Option<ThreatRecord> {
        let threat_type = classify_threat_type(&assessment.factors);
        let threat = ThreatRecord {
            id: Uuid::new_v4(),
            threat_type,
            location_id,
            description: format!(
                "Automated detection at {}: {}",
                location_name,
                assessment.factors.join("; ")
            ),
            severity: assessment.level.base_severity(),
            confidence: assessment.confidence,
            active: true,
            detected_at: Utc::now(),
            resolved_at: None,
            provenance: Provenance::AutomatedMonitoring,
            resolution_notes: None,
            raw_snapshot: serde_json::to_value(snapshot).ok(),
        };

        if let Err(e) = self.store.insert_threat(threat.clone()).await {
            error!(location = %location_name, error = %e, "threat persist failed");
            return None;
        }

        let figures = impact_model::estimate(assessment.level);
        let impact = coastal_domain::ImpactEstimate {
            id: Uuid::new_v4(),
            threat_id: threat.id,
            carbon_loss_tons: figures.carbon_loss_tons,
            economic_loss_usd: figures.economic_loss_usd,
            affected_area_km2: figures.affected_area_km2,
            recovery_time: figures.recovery_time,
        };
        if let Err(e) = self.store.insert_impact(impact).await {
            error!(threat = %threat.id, error = %e, "impact persist failed");
            return None;
        }

        info!(
            location = %location_name,
            threat_type = %threat.threat_type,
            severity = threat.severity,
            "threat materialized"
        );

        self.push.broadcast(PushEvent::NewThreat {
            threat: threat.clone(),
        });
        self.fanout.dispatch(&threat).await;

        Some(threat)
    }

    /// One synthetic generator check. Fires with the configured probability.
    pub async fn run_synthetic(&self) -> Option<ThreatRecord> {
        let locations = self.store.active_locations().await;
        let event = self.synthetic.draw(locations.len())?;
        let location = locations.get(event.location_index)?.clone();
        self.materialize_synthetic(&location.name, location.id, event)
            .await
    }

    /// Persist and fan out a synthetic event. Bypasses the scoring gate and
    /// the impact pipeline: it exists to exercise dashboards, not analysis.
    pub async fn materialize_synthetic(
        &self,
        location_name: &str,
        location_id: Uuid,
        event: SyntheticEvent,
    ) -> Option<ThreatRecord> {
        let threat = ThreatRecord {
            id: Uuid::new_v4(),
            threat_type: event.threat_type,
            location_id,
            description: format!(
                "Simulated {} event near {} for monitoring exercise",
                event.threat_type.to_string().replace('_', " "),
                location_name
            ),
            severity: event.severity,
            confidence: event.confidence,
            active: true,
            detected_at: Utc::now(),
            resolved_at: None,
            provenance: Provenance::SimulatedData,
            resolution_notes: None,
            raw_snapshot: None,
        };

        if let Err(e) = self.store.insert_threat(threat.clone()).await {
            error!(error = %e, "synthetic threat persist failed");
            return None;
        }

        info!(
            location = %location_name,
            threat_type = %threat.threat_type,
            "synthetic threat generated"
        );

        self.push.broadcast(PushEvent::NewThreat {
            threat: threat.clone(),
        });
        self.fanout.dispatch(&threat).await;

        Some(threat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_requires_all_three_conditions() {
        // The reference cases from the scoring contract.
        assert!(gate_passes(ThreatLevel::Medium, 0.75, 2));
        assert!(!gate_passes(ThreatLevel::Medium, 0.65, 2), "confidence below 0.7");
        assert!(!gate_passes(ThreatLevel::High, 0.9, 1), "factor count below 2");
        assert!(!gate_passes(ThreatLevel::Low, 0.95, 5), "level below medium");
    }

    #[test]
    fn test_gate_confidence_is_strict() {
        assert!(
            !gate_passes(ThreatLevel::High, 0.7, 3),
            "confidence exactly 0.7 must not pass"
        );
    }

    #[test]
    fn test_synthetic_source_respects_probability_bounds() {
        let never = SyntheticSource::new(0.0);
        for _ in 0..50 {
            assert!(never.draw(5).is_none());
        }

        let always = SyntheticSource::new(1.0);
        for _ in 0..50 {
            let event = always.draw(5).expect("probability 1.0 always fires");
            assert!(event.location_index < SYNTHETIC_LOCATION_POOL);
            assert!((4.0..9.5).contains(&event.severity));
            assert!((0.6..0.95).contains(&event.confidence));
        }
    }

    #[test]
    fn test_synthetic_source_empty_registry() {
        assert!(SyntheticSource::new(1.0).draw(0).is_none());
    }
}
