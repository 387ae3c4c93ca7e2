//! Configuration types for the compliance agent
//!
//! Defines the configuration structures used throughout the agent.

use std::path::PathBuf;

use compliance_kit::AgentConfig;

/// Where scan records are delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// Records are accepted and discarded
    Discard,
    /// Records are appended to JSON-lines files in this directory
    Directory(PathBuf),
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Discard => write!(f, "discard"),
            TransportKind::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Configuration for a scan run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Node identity, benchmark catalog and evaluator settings
    pub agent: AgentConfig,

    pub scan_id: String,

    pub scan_type: String,

    pub transport: TransportKind,

    /// Write the scan summary JSON here
    pub summary_file: Option<PathBuf>,

    /// Suppress console output
    pub quiet: bool,
}

/// Process exit codes
pub mod exit_code {
    /// Scan completed
    pub const COMPLETED: i32 = 0;
    /// Scan ran and was reported FAILED
    pub const SCAN_FAILED: i32 = 1;
    /// Usage, configuration or bootstrap error
    pub const ERROR: i32 = 2;
}
