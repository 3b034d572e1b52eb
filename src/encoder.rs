//! Snapshot encoding
//!
//! This module encodes a pipeline report into the versioned
//! `ictr.snapshot.v1` JSON payload. A run without an index is encoded with
//! its reason and carries no numeric index values.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::align::CompletenessStrategy;
use crate::builder::{BuildOutcome, ColumnDiagnostics, NoIndexReason};
use crate::error::ComputeError;
use crate::pipeline::{IctrReport, IndicatorDiagnostics};
use crate::summary::IndexSummary;
use crate::{ICTR_VERSION, PRODUCER_NAME};

/// Current output schema version
pub const SNAPSHOT_VERSION: &str = "ictr.snapshot.v1";

/// Output payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IctrPayload {
    pub schema_version: String,
    pub producer: Producer,
    pub provenance: Provenance,
    #[serde(flatten)]
    pub result: SnapshotResult,
    pub indicators: Vec<IndicatorDiagnostics>,
}

/// Software that produced the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub computed_at_utc: String,
    pub indicators_supplied: usize,
    pub indicators_used: usize,
}

/// Index block or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotResult {
    Ok(SnapshotIndex),
    NoIndex(NoIndexReason),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub base: f64,
    pub scale: f64,
    pub explained_variance_ratio: f64,
    pub strategy: CompletenessStrategy,
    pub joined_rows: usize,
    pub retained_rows: usize,
    pub sign_flipped: bool,
    pub summary: IndexSummary,
    pub columns: Vec<ColumnDiagnostics>,
    pub points: Vec<SnapshotPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPoint {
    /// Month-end date, `YYYY-MM-DD`
    pub date: String,
    pub value: f64,
}

/// Encoder for producing snapshot payloads
pub struct IctrEncoder {
    instance_id: String,
}

impl Default for IctrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl IctrEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a report into a snapshot payload
    pub fn encode(&self, report: &IctrReport) -> Result<IctrPayload, ComputeError> {
        let producer = Producer {
            name: PRODUCER_NAME.to_string(),
            version: ICTR_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = Provenance {
            computed_at_utc: Utc::now().to_rfc3339(),
            indicators_supplied: report.indicators_supplied(),
            indicators_used: report.indicators_used(),
        };

        let result = match &report.outcome {
            BuildOutcome::Index(built) => {
                let index = &built.index;
                let summary = IndexSummary::from_index(index).ok_or_else(|| {
                    ComputeError::EncodingError("index has no points".to_string())
                })?;

                if let Some(bad) = index.points.iter().find(|p| !p.value.is_finite()) {
                    return Err(ComputeError::EncodingError(format!(
                        "non-finite index value at {}",
                        bad.date
                    )));
                }

                SnapshotResult::Ok(SnapshotIndex {
                    base: index.base,
                    scale: index.scale,
                    explained_variance_ratio: index.explained_variance_ratio,
                    strategy: built.diagnostics.strategy,
                    joined_rows: built.diagnostics.joined_rows,
                    retained_rows: built.diagnostics.retained_rows,
                    sign_flipped: built.diagnostics.sign_flipped,
                    summary,
                    columns: built.diagnostics.columns.clone(),
                    points: index
                        .points
                        .iter()
                        .map(|p| SnapshotPoint {
                            date: p.date.format("%Y-%m-%d").to_string(),
                            value: p.value,
                        })
                        .collect(),
                })
            }
            BuildOutcome::NoIndex(reason) => SnapshotResult::NoIndex(reason.clone()),
        };

        Ok(IctrPayload {
            schema_version: SNAPSHOT_VERSION.to_string(),
            producer,
            provenance,
            result,
            indicators: report.indicators.clone(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, report: &IctrReport) -> Result<String, ComputeError> {
        let payload = self.encode(report)?;
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildDiagnostics, BuiltIndex};
    use crate::error::Dropped;
    use crate::pipeline::IndicatorStatus;
    use crate::types::{CompositeIndex, GrowthTransform, IndexPoint};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn included(name: &str) -> IndicatorDiagnostics {
        IndicatorDiagnostics {
            indicator: name.to_string(),
            status: IndicatorStatus::Included {
                transform: GrowthTransform::LogDifference,
                growth_points: 2,
                first_date: Some(date(2024, 1, 31)),
                last_date: Some(date(2024, 2, 29)),
            },
        }
    }

    fn index_report() -> IctrReport {
        let index = CompositeIndex {
            points: vec![
                IndexPoint {
                    date: date(2024, 1, 31),
                    value: 95.0,
                    score: -0.5,
                },
                IndexPoint {
                    date: date(2024, 2, 29),
                    value: 105.0,
                    score: 0.5,
                },
            ],
            explained_variance_ratio: 0.8,
            indicators: vec!["GDP".to_string(), "IPI".to_string()],
            base: 100.0,
            scale: 10.0,
        };
        let diagnostics = BuildDiagnostics {
            strategy: CompletenessStrategy::Strict,
            joined_rows: 3,
            retained_rows: 2,
            sign_flipped: false,
            columns: vec![
                ColumnDiagnostics {
                    indicator: "GDP".to_string(),
                    mean: 0.02,
                    std_dev: 0.01,
                    loading: 0.7071,
                },
                ColumnDiagnostics {
                    indicator: "IPI".to_string(),
                    mean: 0.01,
                    std_dev: 0.03,
                    loading: 0.7071,
                },
            ],
        };

        IctrReport {
            outcome: BuildOutcome::Index(BuiltIndex { index, diagnostics }),
            indicators: vec![
                IndicatorDiagnostics {
                    indicator: "CPI".to_string(),
                    status: IndicatorStatus::Dropped {
                        reason: "fetch failed: HTTP 500".to_string(),
                    },
                },
                included("GDP"),
                included("IPI"),
            ],
            dropped: vec![("CPI".to_string(), Dropped::FetchFailed("HTTP 500".to_string()))],
        }
    }

    #[test]
    fn test_encode_snapshot_payload() {
        let encoder = IctrEncoder::with_instance_id("test-instance".to_string());
        let payload = encoder.encode(&index_report()).unwrap();

        assert_eq!(payload.schema_version, SNAPSHOT_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, ICTR_VERSION);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.provenance.indicators_supplied, 3);
        assert_eq!(payload.provenance.indicators_used, 2);

        match payload.result {
            SnapshotResult::Ok(index) => {
                assert_eq!(index.points.len(), 2);
                assert_eq!(index.points[1].date, "2024-02-29");
                assert_eq!(index.points[1].value, 105.0);
                assert_eq!(index.summary.delta, Some(10.0));
                assert!((index.summary.reliability_pct - 80.0).abs() < 1e-9);
            }
            other => panic!("expected an index, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = IctrEncoder::new();
        let json = encoder.encode_to_json(&index_report()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["schema_version"], "ictr.snapshot.v1");
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["strategy"], "strict");
        assert_eq!(parsed["summary"]["trend"], "improving");
        assert_eq!(parsed["indicators"][0]["status"], "dropped");
        assert_eq!(parsed["indicators"][1]["transform"], "log_difference");
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("provenance").is_some());
    }

    #[test]
    fn test_no_index_has_no_numbers() {
        let report = IctrReport {
            outcome: BuildOutcome::NoIndex(NoIndexReason::InsufficientOverlap {
                rows: 7,
                required: 12,
            }),
            indicators: vec![included("GDP")],
            dropped: Vec::new(),
        };

        let json = IctrEncoder::new().encode_to_json(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["status"], "no_index");
        assert_eq!(parsed["reason"], "insufficient_overlap");
        assert_eq!(parsed["rows"], 7);
        assert!(parsed.get("points").is_none());
        assert!(parsed.get("summary").is_none());
        assert!(parsed.get("explained_variance_ratio").is_none());
    }

    #[test]
    fn test_non_finite_index_is_rejected() {
        let mut report = index_report();
        if let BuildOutcome::Index(built) = &mut report.outcome {
            built.index.points[0].value = f64::NAN;
        }
        assert!(matches!(
            IctrEncoder::new().encode(&report),
            Err(ComputeError::EncodingError(_))
        ));
    }
}
