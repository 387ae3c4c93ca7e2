//! Output generation module
//!
//! Provides:
//! - Console output (human-readable)
//! - Summary JSON (scan identity, status and outcome counts)

mod console;
mod summary;

pub use console::{print_failure, print_outcome, print_scan_header};
pub use summary::build_summary;

use compliance_kit::{ScanError, ScanOutcome, ScanRequest};

/// Serialize the scan summary as pretty JSON
pub fn build_output(
    request: &ScanRequest,
    result: Result<&ScanOutcome, &ScanError>,
) -> Result<String, OutputError> {
    serde_json::to_string_pretty(&build_summary(request, result))
        .map_err(|e| OutputError::Serialization(e.to_string()))
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during output generation
#[derive(Debug)]
pub enum OutputError {
    /// Failed to serialize result
    Serialization(String),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Serialization(msg) => write!(f, "Failed to serialize output: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}
