//! Time-bounded snapshot cache.
//!
//! One entry per location, fixed TTL (15 minutes to match the sweep cadence),
//! no eviction beyond staleness: the next successful fetch overwrites the
//! entry. The clock is injected so tests control expiry deterministically.

use chrono::{DateTime, Duration, Utc};
use coastal_domain::EnvironmentalSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Cache TTL used by the reference deployment.
pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Time source for cache expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

struct CacheEntry {
    snapshot: EnvironmentalSnapshot,
    fetched_at: DateTime<Utc>,
}

/// Per-location snapshot cache with time-based staleness.
pub struct SnapshotCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<Uuid, CacheEntry>>,
}

impl SnapshotCache {
    pub fn with_default_ttl() -> Self {
        Self::with_clock(Duration::minutes(DEFAULT_TTL_MINUTES), Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached snapshot if one exists and is still fresh.
    pub async fn get(&self, location_id: Uuid) -> Option<EnvironmentalSnapshot> {
        let entries = self.entries.read().await;
        let entry = entries.get(&location_id)?;
        if self.clock.now() - entry.fetched_at < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    pub async fn put(&self, location_id: Uuid, snapshot: EnvironmentalSnapshot) {
        let mut entries = self.entries.write().await;
        entries.insert(
            location_id,
            CacheEntry {
                snapshot,
                fetched_at: self.clock.now(),
            },
        );
    }

    /// (total entries, fresh entries) for diagnostics.
    pub async fn stats(&self) -> (usize, usize) {
        let entries = self.entries.read().await;
        let now = self.clock.now();
        let fresh = entries
            .values()
            .filter(|e| now - e.fetched_at < self.ttl)
            .count();
        (entries.len(), fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot_for(location_id: Uuid, clock: &dyn Clock) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            location_id,
            captured_at: clock.now(),
            weather: None,
            tide: None,
            satellite: None,
        }
    }

    fn fixed_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_entry_fresh_within_ttl() {
        let clock = Arc::new(ManualClock::at(fixed_start()));
        let cache = SnapshotCache::with_clock(Duration::minutes(15), clock.clone());
        let id = Uuid::new_v4();

        cache.put(id, snapshot_for(id, clock.as_ref())).await;
        clock.advance(Duration::minutes(14));
        assert!(cache.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_entry_stale_at_ttl() {
        let clock = Arc::new(ManualClock::at(fixed_start()));
        let cache = SnapshotCache::with_clock(Duration::minutes(15), clock.clone());
        let id = Uuid::new_v4();

        cache.put(id, snapshot_for(id, clock.as_ref())).await;
        clock.advance(Duration::minutes(15));
        assert!(
            cache.get(id).await.is_none(),
            "an entry exactly at TTL age is stale"
        );
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_entry() {
        let clock = Arc::new(ManualClock::at(fixed_start()));
        let cache = SnapshotCache::with_clock(Duration::minutes(15), clock.clone());
        let id = Uuid::new_v4();

        cache.put(id, snapshot_for(id, clock.as_ref())).await;
        clock.advance(Duration::minutes(20));
        assert!(cache.get(id).await.is_none());

        cache.put(id, snapshot_for(id, clock.as_ref())).await;
        assert!(cache.get(id).await.is_some());

        let (total, fresh) = cache.stats().await;
        assert_eq!((total, fresh), (1, 1), "overwrite must not grow the cache");
    }
}
