//! Command-line interface parsing
//!
//! Handles argument parsing and turns the arguments into a [`ScanConfig`].

use clap::Parser;
use std::path::PathBuf;

use compliance_kit::config::NSA_CISA_SCAN_TYPE;
use compliance_kit::{AgentConfig, ConfigError};

use crate::config::{ScanConfig, TransportKind};

/// Kubernetes compliance scan agent
#[derive(Debug, Parser)]
#[command(name = "compliance_agent", version, about, long_about = None)]
#[command(after_help = "EXIT CODES:\n    0    Scan completed\n    1    Scan failed\n    2    Usage or configuration error")]
pub struct Cli {
    /// Scan identifier reported with every status event (generated when omitted)
    #[arg(long, env = "SCAN_ID")]
    pub scan_id: Option<String>,

    /// Scan type to run
    #[arg(long, default_value = NSA_CISA_SCAN_TYPE)]
    pub scan_type: String,

    /// Agent config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured node id
    #[arg(long)]
    pub node_id: Option<String>,

    /// Override the configured node name
    #[arg(long)]
    pub node_name: Option<String>,

    /// Append status events and documents to JSON-lines files in this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Abort the evaluator after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the scan summary JSON to this file
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// Suppress console output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Load the agent config and apply command-line overrides
    pub fn into_scan_config(self) -> Result<ScanConfig, ConfigError> {
        let mut agent = match &self.config {
            Some(path) => AgentConfig::from_toml_file(path)?,
            None => AgentConfig::default(),
        };

        if let Some(node_id) = self.node_id {
            agent.node_id = node_id;
        }
        if let Some(node_name) = self.node_name {
            agent.node_name = node_name;
        }
        if self.timeout.is_some() {
            agent.evaluator_timeout_secs = self.timeout;
        }
        agent.validate()?;

        let scan_id = self
            .scan_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let transport = match self.output_dir {
            Some(dir) => TransportKind::Directory(dir),
            None => TransportKind::Discard,
        };

        Ok(ScanConfig {
            agent,
            scan_id,
            scan_type: self.scan_type,
            transport,
            summary_file: self.summary,
            quiet: self.quiet,
        })
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
