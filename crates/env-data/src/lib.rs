//! Environmental Data Providers
//!
//! Supplies per-location weather/tide/satellite snapshots for the scan loop:
//! - `MockEnvProvider` - deterministic generator for demos and tests
//! - `OpenMeteoProvider` - live Open-Meteo feed (free, no API key)
//! - `SnapshotCache` - time-bounded per-location cache with injectable clock
//! - `EnvDataService` - primary + fallback + cache composition
//!
//! A fetch only fails with `DataUnavailable` once both the primary source and
//! its fallback have errored; the scan loop then skips that location for the
//! cycle rather than treating it as zero-risk.

pub mod cache;
pub mod mock;
pub mod open_meteo;

pub use cache::{Clock, ManualClock, SnapshotCache, SystemClock};
pub use mock::MockEnvProvider;
pub use open_meteo::OpenMeteoProvider;

use async_trait::async_trait;
use coastal_domain::{EnvironmentalSnapshot, MonitoredLocation};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while fetching environmental data.
#[derive(Error, Debug, Clone)]
pub enum DataError {
    /// Both the live source and its fallback path failed.
    #[error("data unavailable for {location}: {reason}")]
    DataUnavailable { location: String, reason: String },
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("upstream API error: {0}")]
    ApiError(String),
    #[error("parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Source of per-location environmental snapshots.
#[async_trait]
pub trait EnvDataProvider: Send + Sync {
    async fn fetch(&self, location: &MonitoredLocation) -> Result<EnvironmentalSnapshot>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Primary provider plus optional fallback, fronted by the snapshot cache.
///
/// Concurrent callers for the same location within the cache TTL get the
/// cached snapshot back instead of triggering a refetch. Entries are simply
/// overwritten by the next successful fetch; staleness is the only eviction.
pub struct EnvDataService {
    primary: Arc<dyn EnvDataProvider>,
    fallback: Option<Arc<dyn EnvDataProvider>>,
    cache: SnapshotCache,
}

impl EnvDataService {
    pub fn new(primary: Arc<dyn EnvDataProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            cache: SnapshotCache::with_default_ttl(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn EnvDataProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = cache;
        self
    }

    /// Fetch a snapshot for one location, consulting the cache first.
    pub async fn fetch(&self, location: &MonitoredLocation) -> Result<EnvironmentalSnapshot> {
        if let Some(snapshot) = self.cache.get(location.id).await {
            debug!(location = %location.name, "snapshot cache hit");
            return Ok(snapshot);
        }

        let snapshot = match self.primary.fetch(location).await {
            Ok(snapshot) => snapshot,
            Err(primary_err) => {
                let Some(fallback) = &self.fallback else {
                    return Err(DataError::DataUnavailable {
                        location: location.name.clone(),
                        reason: primary_err.to_string(),
                    });
                };
                warn!(
                    location = %location.name,
                    provider = self.primary.name(),
                    error = %primary_err,
                    "primary data source failed, trying fallback"
                );
                match fallback.fetch(location).await {
                    Ok(snapshot) => snapshot,
                    Err(fallback_err) => {
                        return Err(DataError::DataUnavailable {
                            location: location.name.clone(),
                            reason: format!(
                                "primary: {}; fallback: {}",
                                primary_err, fallback_err
                            ),
                        });
                    }
                }
            }
        };

        self.cache.put(location.id, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Snapshot cache diagnostics: (total entries, fresh entries).
    pub async fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    struct AlwaysFails;

    #[async_trait]
    impl EnvDataProvider for AlwaysFails {
        async fn fetch(&self, _location: &MonitoredLocation) -> Result<EnvironmentalSnapshot> {
            Err(DataError::RequestFailed("connection refused".into()))
        }

        fn name(&self) -> &'static str {
            "always-fails"
        }
    }

    fn test_location() -> MonitoredLocation {
        MonitoredLocation::new("Manila Bay", 14.5547, 120.9575)
    }

    #[tokio::test]
    async fn test_both_sources_failing_yields_data_unavailable() {
        let service =
            EnvDataService::new(Arc::new(AlwaysFails)).with_fallback(Arc::new(AlwaysFails));

        let err = service.fetch(&test_location()).await.unwrap_err();
        assert!(
            matches!(err, DataError::DataUnavailable { .. }),
            "expected DataUnavailable, got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_fallback_covers_primary_failure() {
        let service = EnvDataService::new(Arc::new(AlwaysFails))
            .with_fallback(Arc::new(MockEnvProvider::calm()));

        let snapshot = service.fetch(&test_location()).await.unwrap();
        assert!(snapshot.weather.is_some());
    }

    #[tokio::test]
    async fn test_cached_snapshot_served_within_ttl() {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap()));
        let cache = SnapshotCache::with_clock(Duration::minutes(15), clock.clone());
        let provider = MockEnvProvider::calm().with_clock(clock.clone());
        let service = EnvDataService::new(Arc::new(provider)).with_cache(cache);

        let location = test_location();
        let first = service.fetch(&location).await.unwrap();

        clock.advance(Duration::minutes(10));
        let second = service.fetch(&location).await.unwrap();
        assert_eq!(
            first.captured_at, second.captured_at,
            "within TTL the cached snapshot must be returned, not a refetch"
        );

        clock.advance(Duration::minutes(6));
        let third = service.fetch(&location).await.unwrap();
        assert_ne!(
            first.captured_at, third.captured_at,
            "past TTL the entry is stale and a refetch must happen"
        );
    }
}
