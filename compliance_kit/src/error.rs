//! Error taxonomy for compliance scans
//!
//! Each stage of a scan has its own error type. `ScanError` is what
//! `ScanOrchestrator::run` hands back to the caller once a scan has been
//! reported as failed.

use std::path::PathBuf;

use crate::commands::CommandError;
use crate::transport::Topic;

/// Scan request rejected before any side effect
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("scan_id is empty")]
    EmptyScanId,

    #[error("invalid scan_type {scan_type}")]
    UnrecognizedScanType { scan_type: String },
}

/// The benchmark evaluator did not leave a usable result artifact
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    /// Process ran but no artifact was written. Carries both captured streams.
    #[error("{stdout}: {stderr}")]
    MissingArtifact { stdout: String, stderr: String },

    /// Killed at the configured timeout. Carries what it printed before the kill.
    #[error("benchmark evaluator timed out after {timeout_ms}ms: {stdout}: {stderr}")]
    TimedOut {
        timeout_ms: u64,
        stdout: String,
        stderr: String,
    },

    #[error("benchmark evaluator could not be run: {0}")]
    Command(#[from] CommandError),

    #[error("failed to prepare artifact directory {}: {source}", path.display())]
    ArtifactDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read result artifact {}: {source}", path.display())]
    ReadArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Malformed benchmark report
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed benchmark report: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Report is missing its required top-level structure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("benchmark report has no groups field")]
    MissingGroups,
}

/// Delivery failure reported by a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to write {topic} records to {}: {source}", path.display())]
    Io {
        topic: Topic,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {topic} records: {source}")]
    Serialization {
        topic: Topic,
        source: serde_json::Error,
    },

    #[error("transport rejected {topic} records: {reason}")]
    Rejected { topic: Topic, reason: String },
}

/// Compliance documents could not be delivered. Never fatal to a scan.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("failed to ingest {count} compliance documents: {source}")]
    Transport {
        count: usize,
        source: TransportError,
    },
}

/// Agent configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Reason a scan did not complete
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The INPROGRESS status could not be delivered
    #[error("failed to publish scan status: {0}")]
    Status(#[source] TransportError),

    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}
