//! # Compliance Kit
//!
//! Kubernetes compliance scan orchestration. Runs a benchmark evaluator,
//! turns its report into per-check compliance documents plus a summary, and
//! reports the scan lifecycle to a transport.
//!
//! ## Modules
//!
//! - `request` - Validated scan requests and lifecycle statuses
//! - `report` - Benchmark report model and decoder
//! - `aggregator` - Report flattening and summary tally
//! - `ingest` - Document to record conversion and delivery
//! - `status` - Status events and the status reporter
//! - `transport` - Record sinks
//! - `commands` - Whitelisted command execution
//! - `evaluator` - Benchmark runner capability and the steampipe runner
//! - `orchestrator` - Scan lifecycle state machine
//! - `config` - Agent configuration
//! - `error` - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use compliance_kit::{AgentConfig, NoopTransport, ScanOrchestrator, SteampipeRunner};
//! use std::sync::Arc;
//!
//! let config = AgentConfig::default();
//! let runner = Arc::new(SteampipeRunner::from_config(&config));
//! let orchestrator = ScanOrchestrator::new(config, runner, Arc::new(NoopTransport));
//!
//! let request = orchestrator.request("scan-123", "nsa-cisa")?;
//! let outcome = orchestrator.run(&request)?;
//! println!("{} checks", outcome.total_checks());
//! ```

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod ingest;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod status;
pub mod transport;

pub use aggregator::{ComplianceDocument, ComplianceSummary, ResultAggregator};
pub use config::AgentConfig;
pub use error::{
    AggregationError, ConfigError, DecodeError, EvaluatorError, IngestionError, ScanError,
    TransportError, ValidationError,
};
pub use evaluator::{BenchmarkOutput, BenchmarkRunner, SteampipeRunner};
pub use orchestrator::{ScanOrchestrator, ScanOutcome, ScanState};
pub use report::{decode_report, RawBenchmarkReport};
pub use request::{ScanRequest, ScanStatus};
pub use status::{ScanStatusEvent, StatusReporter};
pub use transport::{FileTransport, MemoryTransport, NoopTransport, Record, Topic, Transport};
