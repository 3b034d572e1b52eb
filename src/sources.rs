//! Indicator source descriptors and fetch outcomes
//!
//! Fetchers live outside this crate. They describe what they fetched with a
//! closed [`SourceSystem`] record and hand back a [`FetchOutcome`] per
//! indicator; failures become [`Dropped::FetchFailed`] at the normalizer
//! boundary instead of empty defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Dropped;
use crate::types::RawSeries;

/// Country used when a Eurostat query carries no filters
pub const DEFAULT_GEO: &str = "ES";

/// Economies compared against in peer views
pub const PEER_COUNTRIES: [&str; 6] = ["ES", "DE", "FR", "IT", "PT", "PL"];

/// Statistical system a series comes from, with its query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum SourceSystem {
    /// National statistics office series, addressed by series code
    Ine { series_code: String },
    /// Eurostat dataset with dimension filters (e.g. `unit`, `geo`)
    Eurostat {
        dataset: String,
        #[serde(default)]
        filters: BTreeMap<String, String>,
    },
    /// Grid operator indicator (electricity demand)
    Esios { indicator: u32 },
}

impl SourceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::Ine { .. } => "ine",
            SourceSystem::Eurostat { .. } => "eurostat",
            SourceSystem::Esios { .. } => "esios",
        }
    }

    /// Query filters as sent to the source.
    ///
    /// An unfiltered Eurostat query is restricted to [`DEFAULT_GEO`]; filter
    /// names are matched case-insensitively, so they are lower-cased here.
    pub fn effective_filters(&self) -> BTreeMap<String, String> {
        match self {
            SourceSystem::Eurostat { filters, .. } if filters.is_empty() => {
                BTreeMap::from([("geo".to_string(), DEFAULT_GEO.to_string())])
            }
            SourceSystem::Eurostat { filters, .. } => filters
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            SourceSystem::Ine { .. } | SourceSystem::Esios { .. } => BTreeMap::new(),
        }
    }

    /// Same query for another country; only Eurostat queries are geo-filtered
    pub fn with_geo(&self, country: &str) -> SourceSystem {
        match self {
            SourceSystem::Eurostat { dataset, filters } => {
                let mut filters: BTreeMap<String, String> = filters
                    .iter()
                    .filter(|(k, _)| !k.eq_ignore_ascii_case("geo"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                filters.insert("geo".to_string(), country.to_string());
                SourceSystem::Eurostat {
                    dataset: dataset.clone(),
                    filters,
                }
            }
            other => other.clone(),
        }
    }
}

/// Descriptor of one indicator feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorSource {
    pub indicator_id: String,
    pub source: SourceSystem,
}

impl IndicatorSource {
    pub fn new(indicator_id: impl Into<String>, source: SourceSystem) -> Self {
        Self {
            indicator_id: indicator_id.into(),
            source,
        }
    }
}

/// A fetch that produced no usable series
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct FetchFailed {
    pub reason: String,
}

impl FetchFailed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<FetchFailed> for Dropped {
    fn from(failed: FetchFailed) -> Self {
        Dropped::FetchFailed(failed.reason)
    }
}

/// What a fetcher returns for one indicator
pub type FetchOutcome = Result<RawSeries, FetchFailed>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unfiltered_eurostat_defaults_to_home_country() {
        let source = SourceSystem::Eurostat {
            dataset: "une_rt_m".to_string(),
            filters: BTreeMap::new(),
        };
        assert_eq!(
            source.effective_filters(),
            BTreeMap::from([("geo".to_string(), "ES".to_string())])
        );
    }

    #[test]
    fn test_filters_are_lowercased() {
        let source = SourceSystem::Eurostat {
            dataset: "namq_10_gdp".to_string(),
            filters: BTreeMap::from([("UNIT".to_string(), "CLV_I10".to_string())]),
        };
        assert_eq!(
            source.effective_filters(),
            BTreeMap::from([("unit".to_string(), "CLV_I10".to_string())])
        );
        let ine = SourceSystem::Ine {
            series_code: "IPC251852".to_string(),
        };
        assert!(ine.effective_filters().is_empty());
    }

    #[test]
    fn test_with_geo_replaces_country_filter() {
        let source = SourceSystem::Eurostat {
            dataset: "namq_10_gdp".to_string(),
            filters: BTreeMap::from([
                ("Geo".to_string(), "ES".to_string()),
                ("unit".to_string(), "CLV_I10".to_string()),
            ]),
        };

        for country in PEER_COUNTRIES {
            let peer = source.with_geo(country);
            let filters = peer.effective_filters();
            assert_eq!(filters.len(), 2);
            assert_eq!(filters["geo"], country);
        }

        let esios = SourceSystem::Esios { indicator: 1293 };
        assert_eq!(esios.with_geo("DE"), esios);
    }

    #[test]
    fn test_source_descriptor_json_shape() {
        let source = IndicatorSource::new(
            "CPI",
            SourceSystem::Ine {
                series_code: "IPC251852".to_string(),
            },
        );
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["source"]["system"], "ine");
        assert_eq!(json["source"]["series_code"], "IPC251852");

        let parsed: IndicatorSource = serde_json::from_str(
            r#"{"indicator_id": "HICP", "source": {"system": "eurostat", "dataset": "prc_hicp_manr"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.source.as_str(), "eurostat");
    }

    #[test]
    fn test_fetch_failure_becomes_drop_reason() {
        let dropped: Dropped = FetchFailed::new("HTTP 403").into();
        assert_eq!(dropped, Dropped::FetchFailed("HTTP 403".to_string()));
    }
}
