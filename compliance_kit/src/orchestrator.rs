//! Scan orchestration
//!
//! Drives one scan through its lifecycle:
//!
//! ```text
//! Created ──run()──► InProgress ──┬──► Completed   (report decoded and aggregated)
//!                                 └──► Failed      (no artifact, decode or aggregation error)
//! ```
//!
//! ## Failure policy
//!
//! - INPROGRESS cannot be published: `run()` returns immediately, nothing else is reported.
//! - Evaluator, decode or aggregation failure: FAILED is published with the error text
//!   and the error is returned.
//! - Ingestion failure: logged only, the scan is still COMPLETED.
//! - Terminal status cannot be published: logged only, the outcome stands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregator::{Aggregation, ComplianceSummary, ResultAggregator};
use crate::commands::CommandError;
use crate::config::AgentConfig;
use crate::error::{EvaluatorError, ScanError, ValidationError};
use crate::evaluator::BenchmarkRunner;
use crate::ingest::ingest_documents;
use crate::report::decode_report;
use crate::request::{ScanRequest, ScanStatus};
use crate::status::{completion_extras, StatusReporter};
use crate::transport::{Record, Transport};

/// Lifecycle state of a single scan
///
/// `run()` moves `Created` to `InProgress` by publishing INPROGRESS and then
/// to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Created,
    InProgress,
    Completed,
    Failed,
}

impl ScanState {
    /// Allowed transitions; terminal states accept none
    pub fn can_transition_to(&self, next: ScanState) -> bool {
        matches!(
            (self, next),
            (ScanState::Created, ScanState::InProgress)
                | (ScanState::InProgress, ScanState::Completed)
                | (ScanState::InProgress, ScanState::Failed)
        )
    }
}

/// Result of a completed scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub scan_id: String,
    pub summary: ComplianceSummary,
    /// Records accepted by the transport; zero when ingestion failed
    pub documents_ingested: usize,
    /// Why ingestion failed, if it did
    pub ingestion_error: Option<String>,
}

impl ScanOutcome {
    pub fn total_checks(&self) -> u64 {
        self.summary.total_checks()
    }
}

/// Runs compliance scans against one node
///
/// The config is fixed at construction. The orchestrator holds no per-scan
/// state, so one instance may run several scans concurrently.
pub struct ScanOrchestrator {
    config: AgentConfig,
    runner: Arc<dyn BenchmarkRunner>,
    transport: Arc<dyn Transport>,
    reporter: StatusReporter,
}

impl ScanOrchestrator {
    pub fn new(
        config: AgentConfig,
        runner: Arc<dyn BenchmarkRunner>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let reporter = StatusReporter::new(transport.clone());
        Self {
            config,
            runner,
            transport,
            reporter,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Validate a request against this orchestrator's config
    pub fn request(
        &self,
        scan_id: impl Into<String>,
        scan_type: impl Into<String>,
    ) -> Result<ScanRequest, ValidationError> {
        ScanRequest::new(&self.config, scan_id, scan_type)
    }

    /// Run one scan to a terminal status
    pub fn run(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        if !self.config.is_recognized(request.scan_type()) {
            return Err(ValidationError::UnrecognizedScanType {
                scan_type: request.scan_type().to_string(),
            }
            .into());
        }

        self.reporter
            .report(request, ScanStatus::InProgress, "", Record::new())
            .map_err(|e| {
                log::error!(
                    "Scan {}: failed to publish INPROGRESS status: {}",
                    request.scan_id(),
                    e
                );
                ScanError::Status(e)
            })?;

        log::info!(
            "Scan {} started ({} on node {})",
            request.scan_id(),
            request.benchmark_id(),
            request.node_name()
        );

        match self.evaluate(request) {
            Ok(aggregation) => Ok(self.complete(request, aggregation)),
            Err(e) => {
                log::error!("Scan {} failed: {}", request.scan_id(), e);
                if let Err(report_err) = self.reporter.report(
                    request,
                    ScanStatus::Failed,
                    &e.to_string(),
                    Record::new(),
                ) {
                    log::error!(
                        "Scan {}: failed to publish FAILED status: {}",
                        request.scan_id(),
                        report_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Invoke the evaluator, then decode and aggregate its report
    fn evaluate(&self, request: &ScanRequest) -> Result<Aggregation, ScanError> {
        let artifact = ResultArtifact::create(&self.config.artifact_dir)?;
        let bytes = self.invoke_evaluator(request, artifact.path())?;
        drop(artifact);

        let report = decode_report(&bytes)?;
        let aggregation = ResultAggregator::new(request).aggregate(&report)?;
        Ok(aggregation)
    }

    /// The report file is the success signal; the exit code is only logged.
    /// A timed-out run fails even if a partial report was left behind.
    fn invoke_evaluator(
        &self,
        request: &ScanRequest,
        artifact_path: &Path,
    ) -> Result<Vec<u8>, EvaluatorError> {
        let result = match self
            .runner
            .run_benchmark(request.benchmark_id(), artifact_path)
        {
            Err(CommandError::Timeout {
                timeout_ms,
                stdout,
                stderr,
            }) => {
                return Err(EvaluatorError::TimedOut {
                    timeout_ms,
                    stdout,
                    stderr,
                })
            }
            other => other,
        };

        if !artifact_path.exists() {
            return Err(match result {
                Ok(output) => EvaluatorError::MissingArtifact {
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
                Err(e) => EvaluatorError::Command(e),
            });
        }

        match &result {
            Ok(output) if output.exit_code != 0 => log::info!(
                "Scan {}: evaluator exited with code {}",
                request.scan_id(),
                output.exit_code
            ),
            Err(e) => log::warn!(
                "Scan {}: evaluator reported an error but wrote a report: {}",
                request.scan_id(),
                e
            ),
            _ => {}
        }

        std::fs::read(artifact_path).map_err(|source| EvaluatorError::ReadArtifact {
            path: artifact_path.to_path_buf(),
            source,
        })
    }

    /// Ingest documents and publish COMPLETED. Neither step can fail the scan.
    fn complete(&self, request: &ScanRequest, aggregation: Aggregation) -> ScanOutcome {
        let Aggregation { documents, summary } = aggregation;

        let (documents_ingested, ingestion_error) =
            match ingest_documents(self.transport.as_ref(), documents) {
                Ok(count) => (count, None),
                Err(e) => {
                    log::error!("Scan {}: {}", request.scan_id(), e);
                    (0, Some(e.to_string()))
                }
            };

        let extras = completion_extras(request, &summary);
        if let Err(e) = self
            .reporter
            .report(request, ScanStatus::Completed, "", extras)
        {
            log::error!(
                "Scan {}: failed to publish COMPLETED status: {}",
                request.scan_id(),
                e
            );
        }

        log::info!(
            "Scan {} completed: {} checks ({} ok, {} alarm, {} info, {} skip, {} error)",
            request.scan_id(),
            summary.total_checks(),
            summary.ok,
            summary.alarm,
            summary.info,
            summary.skip,
            summary.error
        );

        ScanOutcome {
            scan_id: request.scan_id().to_string(),
            summary,
            documents_ingested,
            ingestion_error,
        }
    }
}

/// Result file owned by one scan; removed on drop
struct ResultArtifact {
    path: PathBuf,
}

impl ResultArtifact {
    /// Reserve a unique, unguessable path under `dir`
    fn create(dir: &Path) -> Result<Self, EvaluatorError> {
        std::fs::create_dir_all(dir).map_err(|source| EvaluatorError::ArtifactDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        Ok(Self {
            path: dir.join(format!("{}.json", token)),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ResultArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove result artifact {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
