//! Core scanning logic
//!
//! Wires the configured transport and evaluator into an orchestrator and runs
//! one scan.

use std::sync::Arc;
use std::time::Instant;

use compliance_kit::{
    FileTransport, NoopTransport, ScanError, ScanOrchestrator, ScanOutcome, ScanRequest,
    SteampipeRunner, Transport, ValidationError,
};

use crate::config::{exit_code, ScanConfig, TransportKind};
use crate::output;

/// Run a scan with the given configuration
pub fn run_scan(config: &ScanConfig) -> Result<i32, AgentError> {
    let start = Instant::now();

    let transport = create_transport(&config.transport);
    let runner = Arc::new(SteampipeRunner::from_config(&config.agent));
    let orchestrator = ScanOrchestrator::new(config.agent.clone(), runner, transport);

    let request = orchestrator
        .request(config.scan_id.as_str(), config.scan_type.as_str())
        .map_err(AgentError::Validation)?;

    log::info!(
        "Starting scan {} ({})",
        request.scan_id(),
        request.benchmark_id()
    );
    if !config.quiet {
        output::print_scan_header(&request);
    }

    let result = orchestrator.run(&request);

    if !config.quiet {
        match &result {
            Ok(outcome) => output::print_outcome(&request, outcome),
            Err(e) => output::print_failure(&request, e),
        }
        print_execution_info(start.elapsed(), config);
    }

    if let Some(summary_path) = &config.summary_file {
        save_summary(&request, result.as_ref(), config)?;
        if !config.quiet {
            println!("Summary saved to: {}", summary_path.display());
            println!();
        }
    }

    Ok(scan_exit_code(&result))
}

/// Map a scan result to the process exit code
fn scan_exit_code(result: &Result<ScanOutcome, ScanError>) -> i32 {
    match result {
        Ok(_) => exit_code::COMPLETED,
        Err(ScanError::Status(_)) | Err(ScanError::Validation(_)) => exit_code::ERROR,
        Err(_) => exit_code::SCAN_FAILED,
    }
}

/// Create the transport records are delivered to
fn create_transport(kind: &TransportKind) -> Arc<dyn Transport> {
    match kind {
        TransportKind::Discard => Arc::new(NoopTransport),
        TransportKind::Directory(dir) => Arc::new(FileTransport::new(dir.clone())),
    }
}

/// Save summary to file
fn save_summary(
    request: &ScanRequest,
    result: Result<&ScanOutcome, &ScanError>,
    config: &ScanConfig,
) -> Result<(), AgentError> {
    let summary_path = match &config.summary_file {
        Some(path) => path,
        None => return Ok(()),
    };

    let json = output::build_output(request, result).map_err(AgentError::Output)?;

    std::fs::write(summary_path, &json)
        .map_err(|e| AgentError::WriteFile(summary_path.display().to_string(), e))?;

    Ok(())
}

/// Print execution information
fn print_execution_info(duration: std::time::Duration, config: &ScanConfig) {
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    println!("  Transport:    {}", config.transport);
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!();
}

/// Errors that stop the agent before or after a scan
#[derive(Debug)]
pub enum AgentError {
    /// Scan request rejected
    Validation(ValidationError),
    /// Failed to generate output
    Output(output::OutputError),
    /// Failed to write output file
    WriteFile(String, std::io::Error),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::Validation(e) => write!(f, "Invalid scan request: {}", e),
            AgentError::Output(e) => write!(f, "Output generation failed: {}", e),
            AgentError::WriteFile(path, e) => write!(f, "Failed to write {}: {}", path, e),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Validation(e) => Some(e),
            AgentError::Output(e) => Some(e),
            AgentError::WriteFile(_, e) => Some(e),
        }
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
    use compliance_kit::{AgentConfig, EvaluatorError, TransportError};

    fn test_config(scan_id: &str, scan_type: &str, dir: &std::path::Path) -> ScanConfig {
        ScanConfig {
            agent: AgentConfig {
                steampipe_binary: "/nonexistent/steampipe".to_string(),
                mod_path: dir.to_path_buf(),
                artifact_dir: dir.join("artifacts"),
                ..AgentConfig::default()
            },
            scan_id: scan_id.to_string(),
            scan_type: scan_type.to_string(),
            transport: TransportKind::Directory(dir.join("records")),
            summary_file: Some(dir.join("summary.json")),
            quiet: true,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            scan_exit_code(&Err(ScanError::Evaluator(EvaluatorError::MissingArtifact {
                stdout: String::new(),
                stderr: String::new(),
            }))),
            exit_code::SCAN_FAILED
        );
        assert_eq!(
            scan_exit_code(&Err(ScanError::Status(TransportError::Rejected {
                topic: compliance_kit::Topic::ScanLogs,
                reason: "down".to_string(),
            }))),
            exit_code::ERROR
        );
    }

    #[test]
    fn test_invalid_request_is_an_agent_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_scan(&test_config("", "nsa-cisa", dir.path()));

        assert!(matches!(
            result,
            Err(AgentError::Validation(ValidationError::EmptyScanId))
        ));
        assert!(!dir.path().join("records").exists());
    }

    #[test]
    fn test_missing_evaluator_fails_scan_and_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_scan(&test_config("scan-1", "nsa-cisa", dir.path())).unwrap();

        assert_eq!(code, exit_code::SCAN_FAILED);

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["status"], "FAILED");

        let logs =
            std::fs::read_to_string(dir.path().join("records/compliance-scan-logs.jsonl")).unwrap();
        let statuses: Vec<String> = logs
            .lines()
            .map(|line| {
                let envelope: serde_json::Value = serde_json::from_str(line).unwrap();
                envelope["records"][0]["value"]["scan_status"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(statuses, vec!["INPROGRESS", "FAILED"]);
    }
}
