//! Scan requests and lifecycle statuses

use serde::Serialize;

use crate::config::AgentConfig;
use crate::error::ValidationError;

/// A validated request to run one compliance scan
///
/// Fields are private so a request can only exist once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    scan_id: String,
    scan_type: String,
    benchmark_id: String,
    node_id: String,
    node_name: String,
}

impl ScanRequest {
    /// Validate a scan request against the configured benchmark catalog
    ///
    /// Node identity is taken from the config.
    pub fn new(
        config: &AgentConfig,
        scan_id: impl Into<String>,
        scan_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let scan_id = scan_id.into();
        let scan_type = scan_type.into();

        if scan_id.is_empty() {
            return Err(ValidationError::EmptyScanId);
        }

        let benchmark_id = config
            .benchmark_for(&scan_type)
            .ok_or_else(|| ValidationError::UnrecognizedScanType {
                scan_type: scan_type.clone(),
            })?
            .to_string();

        Ok(Self {
            scan_id,
            scan_type,
            benchmark_id,
            node_id: config.node_id.clone(),
            node_name: config.node_name.clone(),
        })
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub fn scan_type(&self) -> &str {
        &self.scan_type
    }

    /// Evaluator benchmark this scan type runs
    pub fn benchmark_id(&self) -> &str {
        &self.benchmark_id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }
}

/// Lifecycle status reported for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    InProgress,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::InProgress => "INPROGRESS",
            ScanStatus::Completed => "COMPLETED",
            ScanStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
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

    fn test_config() -> AgentConfig {
        AgentConfig {
            node_id: "cluster-1".to_string(),
            node_name: "prod".to_string(),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_valid_request_takes_identity_from_config() {
        let request =
            ScanRequest::new(&test_config(), "scan-1", "nsa-cisa").expect("Request rejected");

        assert_eq!(request.scan_id(), "scan-1");
        assert_eq!(request.scan_type(), "nsa-cisa");
        assert_eq!(request.benchmark_id(), "benchmark.nsa_cisa_v1");
        assert_eq!(request.node_id(), "cluster-1");
        assert_eq!(request.node_name(), "prod");
    }

    #[test]
    fn test_empty_scan_id_rejected_for_any_scan_type() {
        let config = test_config();
        for scan_type in ["nsa-cisa", "cis", ""] {
            assert_eq!(
                ScanRequest::new(&config, "", scan_type),
                Err(ValidationError::EmptyScanId)
            );
        }
    }

    #[test]
    fn test_unrecognized_scan_type_rejected() {
        let config = test_config();
        for scan_type in ["cis", "NSA-CISA", "", "benchmark.nsa_cisa_v1"] {
            assert_eq!(
                ScanRequest::new(&config, "scan-1", scan_type),
                Err(ValidationError::UnrecognizedScanType {
                    scan_type: scan_type.to_string()
                })
            );
        }
    }

    #[test]
    fn test_scan_status_strings() {
        assert_eq!(ScanStatus::InProgress.to_string(), "INPROGRESS");
        assert_eq!(ScanStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(ScanStatus::Failed.to_string(), "FAILED");
        assert_eq!(
            serde_json::to_value(ScanStatus::InProgress).unwrap(),
            serde_json::json!("INPROGRESS")
        );
    }
}
