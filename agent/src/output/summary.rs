//! Summary builder
//!
//! Builds minimal summary output with per-outcome counts.

use compliance_kit::{ScanError, ScanOutcome, ScanRequest, ScanStatus};

/// Build the summary JSON for one scan, completed or failed
pub fn build_summary(
    request: &ScanRequest,
    result: Result<&ScanOutcome, &ScanError>,
) -> serde_json::Value {
    let mut summary = serde_json::json!({
        "agent": {
            "id": "compliance-agent",
            "name": "compliance-agent",
            "version": env!("CARGO_PKG_VERSION")
        },
        "scan": {
            "scan_id": request.scan_id(),
            "scan_type": request.scan_type(),
            "benchmark": request.benchmark_id(),
            "node_id": request.node_id(),
            "node_name": request.node_name()
        }
    });

    let details = match result {
        Ok(outcome) => serde_json::json!({
            "status": ScanStatus::Completed.as_str(),
            "summary": outcome.summary,
            "total_checks": outcome.total_checks(),
            "documents_ingested": outcome.documents_ingested,
            "ingestion_error": outcome.ingestion_error
        }),
        Err(error) => serde_json::json!({
            "status": ScanStatus::Failed.as_str(),
            "error": error.to_string()
        }),
    };

    if let (Some(target), serde_json::Value::Object(details)) = (summary.as_object_mut(), details)
    {
        target.extend(details);
    }

    summary
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
