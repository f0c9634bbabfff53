//! End-to-end pipeline tests.
//!
//! Drive full scan cycles against mock environmental feeds and assert on the
//! persisted records, the fan-out, and the push events. No timers here: the
//! loops are exercised by calling the cycle entry points directly.

use async_trait::async_trait;
use coastal_domain::{
    EnvironmentalSnapshot, MonitoredLocation, Provenance, Recipient, StakeholderRole, ThreatLevel,
    ThreatType,
};
use coastwatch_gateway::{
    monitor::{MonitorConfig, SyntheticEvent, ThreatMonitor},
    push::{PushEvent, PushHub},
    store::Store,
};
use env_data::{DataError, EnvDataProvider, EnvDataService, MockEnvProvider};
use impact_model::BASE_CARBON_LOSS_TONS;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct UnreachableFeed;

#[async_trait]
impl EnvDataProvider for UnreachableFeed {
    async fn fetch(&self, _location: &MonitoredLocation) -> env_data::Result<EnvironmentalSnapshot> {
        Err(DataError::RequestFailed("gauge network down".into()))
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        inter_location_delay: Duration::ZERO,
        synthetic_enabled: false,
        ..MonitorConfig::default()
    }
}

async fn single_location_store() -> (Arc<Store>, Uuid) {
    let store = Arc::new(Store::new());
    let location = MonitoredLocation::new("Manila Bay, Roxas Boulevard", 14.5547, 120.9575);
    let id = location.id;
    store.insert_location(location).await;

    store
        .insert_recipient(Recipient {
            id: Uuid::new_v4(),
            name: "NDRRMC Operations Center".into(),
            role: StakeholderRole::EmergencyManagement,
            active: true,
            email: Some("ops@ndrrmc.example.ph".into()),
            phone: Some("+63-2-8911-1406".into()),
            webhook_url: None,
        })
        .await;
    store
        .insert_recipient(Recipient {
            id: Uuid::new_v4(),
            name: "Bacoor Fisherfolk Cooperative".into(),
            role: StakeholderRole::Fisherfolk,
            active: true,
            email: None,
            phone: Some("+63-917-555-0161".into()),
            webhook_url: None,
        })
        .await;

    (store, id)
}

#[tokio::test]
async fn storm_scan_materializes_storm_surge_with_scaled_impact() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(MockEnvProvider::storm()));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    let threat = monitor
        .scan_location(location_id)
        .await
        .expect("storm conditions must pass the materialization gate");

    // Wind keywords match before tide keywords, so this is storm surge.
    assert_eq!(threat.threat_type, ThreatType::StormSurge);
    assert_eq!(threat.provenance, Provenance::AutomatedMonitoring);
    assert!(threat.confidence > 0.7);
    assert!(threat.raw_snapshot.is_some(), "automated threats keep audit input");

    let impact = store
        .impact_for_threat(threat.id)
        .await
        .expect("impact estimate is written right after the threat");
    assert_eq!(impact.carbon_loss_tons, BASE_CARBON_LOSS_TONS * 5.0);

    // High severity (8.0) clears the 7.0 threshold: both recipients alerted.
    let alerts = store.alerts_for_threat(threat.id).await;
    assert_eq!(alerts.len(), 2);

    let location = store.location(location_id).await.unwrap();
    assert_eq!(location.last_threat_level, Some(ThreatLevel::High));
    assert!(location.last_scanned_at.is_some());
}

#[tokio::test]
async fn calm_scan_updates_status_without_materializing() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(MockEnvProvider::calm()));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    assert!(monitor.scan_location(location_id).await.is_none());
    assert!(store.threats(false).await.is_empty());

    // Status still reflects the completed scan.
    let location = store.location(location_id).await.unwrap();
    assert_eq!(location.last_threat_level, Some(ThreatLevel::Low));
    assert!(location.last_scanned_at.is_some());
}

#[tokio::test]
async fn repeated_qualifying_cycles_are_not_deduplicated() {
    // The gate re-evaluates independently each cycle: a persistent storm
    // produces one threat per cycle by design.
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(MockEnvProvider::storm()));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    assert!(monitor.scan_location(location_id).await.is_some());
    assert!(monitor.scan_location(location_id).await.is_some());

    assert_eq!(store.threats(false).await.len(), 2);
}

#[tokio::test]
async fn unreachable_feed_skips_location_without_failing_sweep() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(UnreachableFeed));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    // run_sweep must come back despite every fetch failing.
    monitor.run_sweep().await;

    assert!(store.threats(false).await.is_empty());
    let location = store.location(location_id).await.unwrap();
    assert!(
        location.last_scanned_at.is_none(),
        "a skipped location keeps its last-known status untouched"
    );
}

#[tokio::test]
async fn fallback_feed_keeps_the_scan_alive() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(UnreachableFeed))
        .with_fallback(Arc::new(MockEnvProvider::storm()));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    assert!(monitor.scan_location(location_id).await.is_some());
}

#[tokio::test]
async fn new_threat_event_is_broadcast() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let mut rx = push.subscribe();

    let env = EnvDataService::new(Arc::new(MockEnvProvider::storm()));
    let monitor = ThreatMonitor::new(store, push, env, test_config());
    let threat = monitor.scan_location(location_id).await.unwrap();

    match rx.try_recv() {
        Ok(PushEvent::NewThreat { threat: pushed }) => assert_eq!(pushed.id, threat.id),
        other => panic!("expected NewThreat broadcast, got {:?}", other),
    }
}

#[tokio::test]
async fn synthetic_event_bypasses_scoring_and_impact() {
    let (store, location_id) = single_location_store().await;
    let push = Arc::new(PushHub::new());
    let env = EnvDataService::new(Arc::new(MockEnvProvider::calm()));
    let monitor = ThreatMonitor::new(store.clone(), push, env, test_config());

    let threat = monitor
        .materialize_synthetic(
            "Manila Bay, Roxas Boulevard",
            location_id,
            SyntheticEvent {
                location_index: 0,
                threat_type: ThreatType::IllegalDumping,
                severity: 7.5,
                confidence: 0.8,
            },
        )
        .await
        .expect("synthetic events persist unconditionally");

    assert_eq!(threat.provenance, Provenance::SimulatedData);
    assert_eq!(threat.threat_type, ThreatType::IllegalDumping);
    assert!(
        store.impact_for_threat(threat.id).await.is_none(),
        "synthetic events skip the impact pipeline"
    );
    assert!(
        !store.alerts_for_threat(threat.id).await.is_empty(),
        "synthetic events still fan out"
    );
}
