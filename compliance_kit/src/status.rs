//! Scan status events
//!
//! A [`ScanStatusEvent`] is built once per lifecycle transition and flattened
//! into a single record for the `compliance-scan-logs` topic.
//!
//! ## Record layout
//!
//! Identity fields are written first, then caller extras are merged on top.
//! Extras win on key collisions (last write wins), so a caller can enrich an
//! event but can also replace a standard field such as `node_name`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::aggregator::ComplianceSummary;
use crate::error::TransportError;
use crate::request::{ScanRequest, ScanStatus};
use crate::transport::{Record, Topic, Transport};

/// `type` value stamped on every status record
pub const SCAN_LOG_TYPE: &str = "compliance-scan-logs";

/// One lifecycle transition of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStatusEvent {
    pub scan_id: String,
    pub scan_type: String,
    pub node_id: String,
    pub node_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: ScanStatus,
    /// Single-line message; embedded newlines are already replaced
    pub message: String,
    pub extras: Record,
}

impl ScanStatusEvent {
    /// Build an event stamped with the current time
    pub fn new(request: &ScanRequest, status: ScanStatus, message: &str, extras: Record) -> Self {
        Self::with_timestamp(request, status, message, extras, Utc::now())
    }

    pub fn with_timestamp(
        request: &ScanRequest,
        status: ScanStatus,
        message: &str,
        extras: Record,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            scan_id: request.scan_id().to_string(),
            scan_type: request.scan_type().to_string(),
            node_id: request.node_id().to_string(),
            node_name: request.node_name().to_string(),
            timestamp,
            status,
            message: normalize_message(message),
            extras,
        }
    }

    /// Identity fields only, before extras are applied
    fn base_record(&self) -> Record {
        let mut record = Record::new();
        let mut put = |key: &str, value: Value| {
            record.insert(key.to_string(), value);
        };

        put("scan_id", self.scan_id.clone().into());
        put("time_stamp", self.timestamp.timestamp_millis().into());
        put("@timestamp", self.timestamp.to_rfc3339().into());
        put("scan_message", self.message.clone().into());
        put("scan_status", self.status.as_str().into());
        put("type", SCAN_LOG_TYPE.into());
        put("node_name", self.node_name.clone().into());
        put("node_id", self.node_id.clone().into());
        put("kubernetes_cluster_name", self.node_name.clone().into());
        put("kubernetes_cluster_id", self.node_id.clone().into());
        put("compliance_check_type", self.scan_type.clone().into());

        record
    }

    /// Flatten into a transport record with extras merged last
    pub fn to_record(&self) -> Record {
        merge_extras(self.base_record(), &self.extras)
    }
}

/// Overlay `extras` onto `base`; keys present in both take the extras value
pub fn merge_extras(mut base: Record, extras: &Record) -> Record {
    for (key, value) in extras {
        base.insert(key.clone(), value.clone());
    }
    base
}

/// Replace line breaks so the message stays on one line
pub fn normalize_message(message: &str) -> String {
    message.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Extras attached to the COMPLETED event
pub fn completion_extras(request: &ScanRequest, summary: &ComplianceSummary) -> Record {
    let mut extras = Record::new();
    extras.insert(
        "node_name".to_string(),
        Value::String(request.node_name().to_string()),
    );
    extras.insert(
        "node_id".to_string(),
        Value::String(request.node_id().to_string()),
    );
    extras.insert(
        "result".to_string(),
        Value::Object(summary_record(summary)),
    );
    extras.insert(
        "total_checks".to_string(),
        Value::from(summary.total_checks()),
    );
    extras
}

/// Summary counts keyed by outcome
fn summary_record(summary: &ComplianceSummary) -> Record {
    let mut record = Record::new();
    record.insert("alarm".to_string(), Value::from(summary.alarm));
    record.insert("ok".to_string(), Value::from(summary.ok));
    record.insert("info".to_string(), Value::from(summary.info));
    record.insert("skip".to_string(), Value::from(summary.skip));
    record.insert("error".to_string(), Value::from(summary.error));
    record
}

/// Publishes status events for scans
#[derive(Clone)]
pub struct StatusReporter {
    transport: Arc<dyn Transport>,
}

impl StatusReporter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build one status event and deliver it
    pub fn report(
        &self,
        request: &ScanRequest,
        status: ScanStatus,
        message: &str,
        extras: Record,
    ) -> Result<(), TransportError> {
        let event = ScanStatusEvent::new(request, status, message, extras);
        self.publish(&event)
    }

    /// Deliver an already built event
    pub fn publish(&self, event: &ScanStatusEvent) -> Result<(), TransportError> {
        log::debug!(
            "Publishing {} status for scan {}",
            event.status,
            event.scan_id
        );
        self.transport
            .publish(Topic::ScanLogs, std::slice::from_ref(&event.to_record()))
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::transport::MemoryTransport;
    use chrono::TimeZone;

    fn test_request() -> ScanRequest {
        let config = AgentConfig {
            node_id: "cluster-1".to_string(),
            node_name: "prod".to_string(),
            ..AgentConfig::default()
        };
        ScanRequest::new(&config, "scan-1", "nsa-cisa").unwrap()
    }

    fn extras(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_record_contains_identity_fields() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = ScanStatusEvent::with_timestamp(
            &test_request(),
            ScanStatus::InProgress,
            "",
            Record::new(),
            timestamp,
        );
        let record = event.to_record();

        assert_eq!(record["scan_id"], "scan-1");
        assert_eq!(record["scan_status"], "INPROGRESS");
        assert_eq!(record["scan_message"], "");
        assert_eq!(record["type"], SCAN_LOG_TYPE);
        assert_eq!(record["node_id"], "cluster-1");
        assert_eq!(record["node_name"], "prod");
        assert_eq!(record["kubernetes_cluster_id"], "cluster-1");
        assert_eq!(record["kubernetes_cluster_name"], "prod");
        assert_eq!(record["compliance_check_type"], "nsa-cisa");
        assert_eq!(record["time_stamp"], timestamp.timestamp_millis());
        assert_eq!(record["@timestamp"], timestamp.to_rfc3339());
        assert_eq!(record.len(), 11);
    }

    #[test]
    fn test_extras_override_colliding_keys() {
        let event = ScanStatusEvent::new(
            &test_request(),
            ScanStatus::Completed,
            "done",
            extras(&[
                ("node_name", "renamed".into()),
                ("scan_message", "clobbered".into()),
                ("total_checks", 3.into()),
            ]),
        );
        let record = event.to_record();

        assert_eq!(record["node_name"], "renamed");
        assert_eq!(record["scan_message"], "clobbered");
        assert_eq!(record["total_checks"], 3);
        assert_eq!(record["kubernetes_cluster_name"], "prod");
        assert_eq!(event.message, "done");
    }

    #[test]
    fn test_merge_extras_last_write_wins() {
        let base = extras(&[("a", 1.into()), ("b", 2.into())]);
        let merged = merge_extras(base, &extras(&[("b", 20.into()), ("c", 30.into())]));

        assert_eq!(merged, extras(&[("a", 1.into()), ("b", 20.into()), ("c", 30.into())]));
    }

    #[test]
    fn test_message_newlines_become_spaces() {
        assert_eq!(normalize_message("line one\nline two"), "line one line two");
        assert_eq!(normalize_message("a\r\nb\rc"), "a b c");
        assert_eq!(normalize_message("single"), "single");

        let event = ScanStatusEvent::new(
            &test_request(),
            ScanStatus::Failed,
            "stdout\nstderr\n",
            Record::new(),
        );
        assert!(!event.message.contains('\n'));
        assert_eq!(event.to_record()["scan_message"], "stdout stderr ");
    }

    #[test]
    fn test_completion_extras() {
        let summary = ComplianceSummary {
            alarm: 1,
            ok: 2,
            ..ComplianceSummary::default()
        };
        let extras = completion_extras(&test_request(), &summary);

        assert_eq!(extras["total_checks"], 3);
        assert_eq!(extras["result"]["alarm"], 1);
        assert_eq!(extras["result"]["ok"], 2);
        assert_eq!(extras["result"]["error"], 0);
        assert_eq!(extras["result"].as_object().unwrap().len(), 5);
        assert_eq!(extras["node_id"], "cluster-1");
    }

    #[test]
    fn test_reporter_delivers_exactly_one_record() {
        let transport = Arc::new(MemoryTransport::new());
        let reporter = StatusReporter::new(transport.clone());

        reporter
            .report(&test_request(), ScanStatus::InProgress, "", Record::new())
            .unwrap();

        let batches = transport.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, Topic::ScanLogs);
        assert_eq!(batches[0].1.len(), 1);
        assert_eq!(batches[0].1[0]["scan_status"], "INPROGRESS");
    }

    #[test]
    fn test_reporter_surfaces_transport_failure() {
        let reporter = StatusReporter::new(Arc::new(
            MemoryTransport::new().failing_on(Topic::ScanLogs),
        ));

        let result = reporter.report(&test_request(), ScanStatus::InProgress, "", Record::new());
        assert!(matches!(result, Err(TransportError::Rejected { .. })));
    }
}
