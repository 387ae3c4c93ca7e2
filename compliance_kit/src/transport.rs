//! Record transport
//!
//! The core hands flattened key-value records to a [`Transport`] and never
//! looks back: delivery is fire-and-forget and callers decide whether a
//! failure matters.
//!
//! ## Sinks
//!
//! - [`NoopTransport`] - accepts and discards
//! - [`FileTransport`] - appends REST-envelope JSON lines per topic
//! - [`MemoryTransport`] - keeps everything in memory for inspection

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::TransportError;

/// One flattened record
pub type Record = Map<String, Value>;

/// Destination stream for records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Scan lifecycle status events
    ScanLogs,
    /// Per-check compliance documents
    ComplianceDocuments,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ScanLogs => "compliance-scan-logs",
            Topic::ComplianceDocuments => "compliance",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivers records to a collector
///
/// Implementations must be thread-safe (`Send + Sync`) so hosts can share one
/// transport between concurrent orchestrators.
pub trait Transport: Send + Sync {
    /// Deliver a batch of records for one topic
    fn publish(&self, topic: Topic, records: &[Record]) -> Result<(), TransportError>;
}

/// Wrap records in the REST ingestion envelope: `{"records":[{"value":...}]}`
pub fn to_rest_envelope(records: &[Record]) -> Value {
    let wrapped: Vec<Value> = records
        .iter()
        .map(|record| serde_json::json!({ "value": record }))
        .collect();

    serde_json::json!({ "records": wrapped })
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn publish(&self, topic: Topic, records: &[Record]) -> Result<(), TransportError> {
        log::debug!("Discarding {} {} record(s)", records.len(), topic);
        Ok(())
    }
}

/// Appends one REST envelope per publish to `<dir>/<topic>.jsonl`
#[derive(Debug, Clone)]
pub struct FileTransport {
    dir: PathBuf,
}

impl FileTransport {
    /// The directory is created on first publish
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File records for a topic are appended to
    pub fn topic_path(&self, topic: Topic) -> PathBuf {
        self.dir.join(format!("{}.jsonl", topic.as_str()))
    }
}

impl Transport for FileTransport {
    fn publish(&self, topic: Topic, records: &[Record]) -> Result<(), TransportError> {
        if records.is_empty() {
            return Ok(());
        }

        let path = self.topic_path(topic);
        let io_error = |source| TransportError::Io {
            topic,
            path: path.clone(),
            source,
        };

        let mut line = serde_json::to_string(&to_rest_envelope(records))
            .map_err(|source| TransportError::Serialization { topic, source })?;
        line.push('\n');

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error)?;
        file.write_all(line.as_bytes()).map_err(io_error)?;

        log::debug!(
            "Wrote {} {} record(s) to {}",
            records.len(),
            topic,
            path.display()
        );
        Ok(())
    }
}

/// Collects published batches in memory
///
/// Topics registered with [`MemoryTransport::failing_on`] or
/// [`MemoryTransport::failing_after`] reject publishes without recording them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    batches: Mutex<Vec<(Topic, Vec<Record>)>>,
    /// Topic -> publishes accepted before it starts rejecting
    failing: HashMap<Topic, usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish to `topic`
    pub fn failing_on(self, topic: Topic) -> Self {
        self.failing_after(topic, 0)
    }

    /// Accept the first `accepted` publishes to `topic`, reject the rest
    pub fn failing_after(mut self, topic: Topic, accepted: usize) -> Self {
        self.failing.insert(topic, accepted);
        self
    }

    /// Every accepted batch, in publish order
    pub fn batches(&self) -> Vec<(Topic, Vec<Record>)> {
        self.lock().clone()
    }

    /// All records accepted for one topic, flattened across batches
    pub fn records(&self, topic: Topic) -> Vec<Record> {
        self.lock()
            .iter()
            .filter(|(t, _)| *t == topic)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Topic, Vec<Record>)>> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn publish(&self, topic: Topic, records: &[Record]) -> Result<(), TransportError> {
        let mut batches = self.lock();
        if let Some(&accepted) = self.failing.get(&topic) {
            if batches.iter().filter(|(t, _)| *t == topic).count() >= accepted {
                return Err(TransportError::Rejected {
                    topic,
                    reason: "topic configured to fail".to_string(),
                });
            }
        }

        batches.push((topic, records.to_vec()));
        Ok(())
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
