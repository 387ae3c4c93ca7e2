//! Agent configuration
//!
//! Node identity, the benchmark catalog and evaluator settings. A config is
//! built once (defaults, TOML file, CLI overrides) and is read-only once the
//! orchestrator holds it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// The one scan type recognized out of the box
pub const NSA_CISA_SCAN_TYPE: &str = "nsa-cisa";

/// Evaluator benchmark run for [`NSA_CISA_SCAN_TYPE`]
pub const NSA_CISA_BENCHMARK: &str = "benchmark.nsa_cisa_v1";

/// Install location of the Kubernetes compliance mod in the agent image
pub const DEFAULT_MOD_PATH: &str = "/opt/steampipe/steampipe-mod-kubernetes-compliance";

/// Configuration for a compliance agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Identifier of the node (cluster) being scanned
    pub node_id: String,

    /// Display name of the node (cluster) being scanned
    pub node_name: String,

    /// Recognized scan types mapped to the evaluator benchmark they run
    pub benchmarks: BTreeMap<String, String>,

    /// Evaluator executable
    pub steampipe_binary: String,

    /// Directory the evaluator runs in (the compliance mod checkout)
    pub mod_path: PathBuf,

    /// Where per-scan result artifacts are written
    pub artifact_dir: PathBuf,

    /// Upper bound on a single evaluator run. `None` waits indefinitely.
    pub evaluator_timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let mut benchmarks = BTreeMap::new();
        benchmarks.insert(
            NSA_CISA_SCAN_TYPE.to_string(),
            NSA_CISA_BENCHMARK.to_string(),
        );

        Self {
            node_id: env::var("NODE_ID").unwrap_or_default(),
            node_name: env::var("NODE_NAME").unwrap_or_default(),
            benchmarks,
            steampipe_binary: "steampipe".to_string(),
            mod_path: env::var("COMPLIANCE_MOD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MOD_PATH)),
            artifact_dir: env::var("COMPLIANCE_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            evaluator_timeout_secs: None,
        }
    }
}

impl AgentConfig {
    /// Parse a TOML document. Absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the invariants the orchestrator relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.benchmarks.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one benchmark must be configured".to_string(),
            ));
        }

        if let Some((scan_type, _)) = self
            .benchmarks
            .iter()
            .find(|(scan_type, benchmark)| scan_type.is_empty() || benchmark.is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "benchmark entry '{}' must have a non-empty scan type and benchmark id",
                scan_type
            )));
        }

        if self.steampipe_binary.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "steampipe_binary must not be empty".to_string(),
            ));
        }

        if self.evaluator_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "evaluator_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Benchmark identifier for a scan type, if the scan type is recognized
    pub fn benchmark_for(&self, scan_type: &str) -> Option<&str> {
        self.benchmarks.get(scan_type).map(String::as_str)
    }

    pub fn is_recognized(&self, scan_type: &str) -> bool {
        self.benchmarks.contains_key(scan_type)
    }

    pub fn evaluator_timeout(&self) -> Option<Duration> {
        self.evaluator_timeout_secs.map(Duration::from_secs)
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
    use std::io::Write;

    #[test]
    fn test_default_recognizes_only_nsa_cisa() {
        let config = AgentConfig::default();

        assert_eq!(config.benchmarks.len(), 1);
        assert!(config.is_recognized("nsa-cisa"));
        assert_eq!(
            config.benchmark_for("nsa-cisa"),
            Some("benchmark.nsa_cisa_v1")
        );
        assert!(!config.is_recognized("cis"));
        assert!(config.evaluator_timeout().is_none());
    }

    #[test]
    fn test_from_toml_str_keeps_defaults_for_absent_keys() {
        let config = AgentConfig::from_toml_str(
            r#"
            node_id = "cluster-42"
            node_name = "prod-east"
            evaluator_timeout_secs = 900
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.node_id, "cluster-42");
        assert_eq!(config.node_name, "prod-east");
        assert_eq!(config.evaluator_timeout(), Some(Duration::from_secs(900)));
        assert!(config.is_recognized(NSA_CISA_SCAN_TYPE));
        assert_eq!(config.steampipe_binary, "steampipe");
    }

    #[test]
    fn test_from_toml_str_replaces_benchmark_catalog() {
        let config = AgentConfig::from_toml_str(
            r#"
            [benchmarks]
            "cis-1.7" = "benchmark.cis_v170"
            "#,
        )
        .expect("Failed to parse config");

        assert!(config.is_recognized("cis-1.7"));
        assert!(!config.is_recognized(NSA_CISA_SCAN_TYPE));
    }

    #[test]
    fn test_validate_rejects_empty_catalog() {
        let result = AgentConfig::from_toml_str("[benchmarks]\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = AgentConfig::from_toml_str("evaluator_timeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_toml_str_reports_parse_errors() {
        let result = AgentConfig::from_toml_str("node_id = [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "node_name = \"staging\"").unwrap();

        let config = AgentConfig::from_toml_file(file.path()).expect("Failed to load config");
        assert_eq!(config.node_name, "staging");

        let missing = AgentConfig::from_toml_file(Path::new("/nonexistent/agent.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
