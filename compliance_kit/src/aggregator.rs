//! Result aggregation
//!
//! Flattens a decoded benchmark report into one [`ComplianceDocument`] per
//! check result and tallies a [`ComplianceSummary`] over them.
//!
//! ## Traversal
//!
//! ```text
//! report.groups[]
//!     └── group.controls[]          (in order)
//!             └── control.results[] → one document each
//!     └── group.groups[]            (depth-first, after the group's own controls)
//! ```
//!
//! Every result produces exactly one document and exactly one summary
//! increment, so `summary.total_checks() == documents.len()` always holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AggregationError;
use crate::report::{BenchmarkControl, BenchmarkGroup, CheckResult, RawBenchmarkReport};
use crate::request::ScanRequest;

/// Recognized check outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Ok,
    Alarm,
    Info,
    Skip,
    Error,
}

impl CheckStatus {
    /// Parse an evaluator status string; `None` for anything unrecognized
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "ok" => Some(CheckStatus::Ok),
            "alarm" => Some(CheckStatus::Alarm),
            "info" => Some(CheckStatus::Info),
            "skip" => Some(CheckStatus::Skip),
            "error" => Some(CheckStatus::Error),
            _ => None,
        }
    }
}

/// Per-outcome tally for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub alarm: u64,
    pub ok: u64,
    pub info: u64,
    pub skip: u64,
    pub error: u64,
}

impl ComplianceSummary {
    /// Count one result. Unrecognized statuses land in `error`.
    pub fn record(&mut self, raw_status: &str) {
        match CheckStatus::from_raw(raw_status) {
            Some(CheckStatus::Ok) => self.ok += 1,
            Some(CheckStatus::Alarm) => self.alarm += 1,
            Some(CheckStatus::Info) => self.info += 1,
            Some(CheckStatus::Skip) => self.skip += 1,
            Some(CheckStatus::Error) | None => self.error += 1,
        }
    }

    pub fn total_checks(&self) -> u64 {
        self.alarm + self.ok + self.info + self.skip + self.error
    }
}

/// One check result for one resource, stamped with scan identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDocument {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,

    pub doc_id: String,

    pub scan_id: String,

    pub node_id: String,

    pub node_name: String,

    /// Scan type the check belongs to
    #[serde(rename = "compliance_check_type")]
    pub check_type: String,

    #[serde(rename = "resource")]
    pub resource_id: String,

    pub resource_type: String,

    /// Status exactly as the evaluator reported it
    pub status: String,

    pub description: String,

    /// Title of the enclosing benchmark group
    pub group: String,

    pub control_id: String,

    /// Title of the control
    pub title: String,

    pub severity: String,
}

/// Documents plus summary produced from one report
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub documents: Vec<ComplianceDocument>,
    pub summary: ComplianceSummary,
}

/// Builds compliance documents for a single scan
pub struct ResultAggregator<'a> {
    request: &'a ScanRequest,
    timestamp: DateTime<Utc>,
}

impl<'a> ResultAggregator<'a> {
    /// Documents are stamped with the current time
    pub fn new(request: &'a ScanRequest) -> Self {
        Self::with_timestamp(request, Utc::now())
    }

    pub fn with_timestamp(request: &'a ScanRequest, timestamp: DateTime<Utc>) -> Self {
        Self { request, timestamp }
    }

    /// Flatten a report into documents and a summary
    pub fn aggregate(&self, report: &RawBenchmarkReport) -> Result<Aggregation, AggregationError> {
        let groups = report
            .groups
            .as_ref()
            .ok_or(AggregationError::MissingGroups)?;

        let mut aggregation = Aggregation {
            documents: Vec::new(),
            summary: ComplianceSummary::default(),
        };

        for group in groups {
            self.walk_group(group, &mut aggregation);
        }

        log::debug!(
            "Aggregated {} compliance documents for scan {}",
            aggregation.documents.len(),
            self.request.scan_id()
        );

        Ok(aggregation)
    }

    fn walk_group(&self, group: &BenchmarkGroup, aggregation: &mut Aggregation) {
        for control in &group.controls {
            for result in &control.results {
                aggregation.summary.record(&result.status);
                aggregation
                    .documents
                    .push(self.build_document(group, control, result));
            }
        }

        for child in &group.groups {
            self.walk_group(child, aggregation);
        }
    }

    fn build_document(
        &self,
        group: &BenchmarkGroup,
        control: &BenchmarkControl,
        result: &CheckResult,
    ) -> ComplianceDocument {
        ComplianceDocument {
            timestamp: self.timestamp,
            doc_id: uuid::Uuid::new_v4().to_string(),
            scan_id: self.request.scan_id().to_string(),
            node_id: self.request.node_id().to_string(),
            node_name: self.request.node_name().to_string(),
            check_type: self.request.scan_type().to_string(),
            resource_id: result.resource.clone(),
            resource_type: resource_type(control, result),
            status: result.status.clone(),
            description: result.reason.clone(),
            group: group.title.clone(),
            control_id: control.control_id.clone(),
            title: control.title.clone(),
            severity: control.severity.clone(),
        }
    }
}

/// Convenience wrapper around [`ResultAggregator::aggregate`]
pub fn aggregate(
    report: &RawBenchmarkReport,
    request: &ScanRequest,
) -> Result<Aggregation, AggregationError> {
    ResultAggregator::new(request).aggregate(report)
}

/// Resource kind from the result dimensions, falling back to the control's service tag
fn resource_type(control: &BenchmarkControl, result: &CheckResult) -> String {
    result
        .dimension("kind")
        .or_else(|| result.dimension("resource_type"))
        .or_else(|| control.tags.get("service").map(String::as_str))
        .unwrap_or_default()
        .to_string()
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
