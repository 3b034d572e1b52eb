//! Fetched-series cache
//!
//! An explicit, caller-owned cache for raw series obtained from statistical
//! sources. Entries are keyed by indicator id and the full source descriptor
//! (series code, dataset and effective filters) and remember when they were
//! fetched; expiry is checked by the
//! caller against a clock it supplies. The index pipeline itself never reads
//! from this cache.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::sources::{IndicatorSource, SourceSystem};
use crate::types::RawSeries;

/// Default time-to-live of a cached series (one day)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 86_400;

/// Identity of a fetched series.
///
/// The whole source descriptor takes part, with Eurostat filters in the form
/// actually sent to the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub indicator_id: String,
    pub source: SourceSystem,
}

impl From<&IndicatorSource> for CacheKey {
    fn from(source: &IndicatorSource) -> Self {
        let normalized = match &source.source {
            SourceSystem::Eurostat { dataset, .. } => SourceSystem::Eurostat {
                dataset: dataset.clone(),
                filters: source.source.effective_filters(),
            },
            other => other.clone(),
        };
        Self {
            indicator_id: source.indicator_id.clone(),
            source: normalized,
        }
    }
}

/// Cached value with its fetch time
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSeries {
    pub series: RawSeries,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSeries {
    /// Whether the entry is younger than `ttl` at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// In-memory cache of fetched raw series
#[derive(Debug, Clone)]
pub struct SeriesCache {
    entries: HashMap<CacheKey, CachedSeries>,
    ttl: Duration,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CACHE_TTL_SECS))
    }
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a successfully fetched series, replacing any previous entry
    pub fn insert(&mut self, source: &IndicatorSource, series: RawSeries, fetched_at: DateTime<Utc>) {
        self.entries
            .insert(CacheKey::from(source), CachedSeries { series, fetched_at });
    }

    /// Entry for `source` regardless of age
    pub fn get(&self, source: &IndicatorSource) -> Option<&CachedSeries> {
        self.entries.get(&CacheKey::from(source))
    }

    /// Series for `source` if it has not expired at `now`
    pub fn get_fresh(&self, source: &IndicatorSource, now: DateTime<Utc>) -> Option<&RawSeries> {
        self.get(source)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.series)
    }

    /// Drop every entry expired at `now`; returns how many were removed
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "evicted expired series");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use std::collections::BTreeMap;

    fn source(dataset: &str, geo: &str) -> IndicatorSource {
        IndicatorSource::new(
            "GDP",
            SourceSystem::Eurostat {
                dataset: dataset.to_string(),
                filters: BTreeMap::from([("geo".to_string(), geo.to_string())]),
            },
        )
    }

    fn series() -> RawSeries {
        RawSeries::from_pairs(
            "GDP",
            vec![(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 101.5)],
        )
    }

    #[test]
    fn test_fresh_entry_is_returned_until_ttl() {
        let mut cache = SeriesCache::default();
        let fetched_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let src = source("namq_10_gdp", "ES");
        cache.insert(&src, series(), fetched_at);

        let almost = fetched_at + Duration::seconds(DEFAULT_CACHE_TTL_SECS - 1);
        assert_eq!(cache.get_fresh(&src, almost), Some(&series()));

        let expired = fetched_at + Duration::seconds(DEFAULT_CACHE_TTL_SECS);
        assert_eq!(cache.get_fresh(&src, expired), None);
        // Stale entries stay readable until evicted.
        assert!(cache.get(&src).is_some());
    }

    #[test]
    fn test_filters_are_part_of_the_key() {
        let mut cache = SeriesCache::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        cache.insert(&source("namq_10_gdp", "ES"), series(), now);

        assert!(cache.get_fresh(&source("namq_10_gdp", "DE"), now).is_none());
        assert!(cache.get_fresh(&source("namq_10_gdp", "ES"), now).is_some());
    }

    #[test]
    fn test_evict_expired() {
        let mut cache = SeriesCache::new(Duration::hours(1));
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        cache.insert(&source("a", "ES"), series(), t0);
        cache.insert(&source("b", "ES"), series(), t0 + Duration::minutes(45));

        assert_eq!(cache.evict_expired(t0 + Duration::minutes(90)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&source("b", "ES")).is_some());
    }

    #[test]
    fn test_same_indicator_id_from_other_dataset_or_series_is_distinct() {
        let mut cache = SeriesCache::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        cache.insert(&source("namq_10_gdp", "ES"), series(), now);
        assert!(cache.get_fresh(&source("nama_10_gdp", "ES"), now).is_none());

        let ine = |code: &str| {
            IndicatorSource::new(
                "CPI",
                SourceSystem::Ine {
                    series_code: code.to_string(),
                },
            )
        };
        cache.insert(&ine("IPC251852"), series(), now);
        assert!(cache.get_fresh(&ine("IPC999"), now).is_none());
        assert!(cache.get_fresh(&ine("IPC251852"), now).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unfiltered_and_default_geo_queries_share_an_entry() {
        let mut cache = SeriesCache::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let unfiltered = IndicatorSource::new(
            "GDP",
            SourceSystem::Eurostat {
                dataset: "namq_10_gdp".to_string(),
                filters: BTreeMap::new(),
            },
        );

        cache.insert(&unfiltered, series(), now);
        assert!(cache.get_fresh(&source("namq_10_gdp", "ES"), now).is_some());
        assert!(cache.get_fresh(&source("namq_10_gdp", "DE"), now).is_none());
    }
}
