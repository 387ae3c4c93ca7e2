//! Document ingestion
//!
//! Converts compliance documents into flattened records and hands them to the
//! transport. Documents are consumed: once ingested they are no longer owned
//! by the scan.

use serde_json::Value;

use crate::aggregator::ComplianceDocument;
use crate::error::IngestionError;
use crate::transport::{Record, Topic, Transport};

/// `type` value stamped on every document record
pub const COMPLIANCE_DOC_TYPE: &str = "compliance";

/// Flatten one document into an ingestible record
///
/// Adds the cluster aliases (`kubernetes_cluster_name`, `kubernetes_cluster_id`)
/// and the document `type` expected by the collector.
pub fn to_record(document: &ComplianceDocument) -> Result<Record, serde_json::Error> {
    let mut record = match serde_json::to_value(document)? {
        Value::Object(map) => map,
        _ => Record::new(),
    };

    record.insert(
        "kubernetes_cluster_name".to_string(),
        Value::String(document.node_name.clone()),
    );
    record.insert(
        "kubernetes_cluster_id".to_string(),
        Value::String(document.node_id.clone()),
    );
    record.insert(
        "type".to_string(),
        Value::String(COMPLIANCE_DOC_TYPE.to_string()),
    );

    Ok(record)
}

/// Flatten documents, skipping (and logging) any that fail to convert
pub fn to_records(documents: &[ComplianceDocument]) -> Vec<Record> {
    documents
        .iter()
        .filter_map(|document| match to_record(document) {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!(
                    "Failed to convert compliance document {}: {}",
                    document.doc_id,
                    e
                );
                None
            }
        })
        .collect()
}

/// Deliver documents to the transport
///
/// Returns the number of records handed over.
pub fn ingest_documents(
    transport: &dyn Transport,
    documents: Vec<ComplianceDocument>,
) -> Result<usize, IngestionError> {
    log::debug!("Number of docs to ingest: {}", documents.len());

    let records = to_records(&documents);
    drop(documents);

    transport
        .publish(Topic::ComplianceDocuments, &records)
        .map_err(|source| IngestionError::Transport {
            count: records.len(),
            source,
        })?;

    Ok(records.len())
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
