//! Benchmark evaluator invocation
//!
//! The orchestrator only knows the [`BenchmarkRunner`] capability: run this
//! benchmark, write the report to this path, hand back whatever the process
//! printed. Whether a run is usable is decided by the caller from the
//! presence of the report file, not from the exit code (steampipe exits
//! non-zero whenever a control alarms).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::{create_steampipe_command_executor, CommandError, SystemCommandExecutor};
use crate::config::AgentConfig;

/// Captured output of one evaluator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Runs a named benchmark and writes its JSON report to `output_path`
pub trait BenchmarkRunner: Send + Sync {
    fn run_benchmark(
        &self,
        benchmark_id: &str,
        output_path: &Path,
    ) -> Result<BenchmarkOutput, CommandError>;
}

/// Runs benchmarks with `steampipe check` inside the compliance mod directory
#[derive(Debug, Clone)]
pub struct SteampipeRunner {
    binary: String,
    mod_path: PathBuf,
    executor: SystemCommandExecutor,
}

impl SteampipeRunner {
    pub fn new(
        binary: impl Into<String>,
        mod_path: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        let binary = binary.into();
        let executor = create_steampipe_command_executor(&binary, timeout);
        Self {
            binary,
            mod_path: mod_path.into(),
            executor,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.steampipe_binary.clone(),
            config.mod_path.clone(),
            config.evaluator_timeout(),
        )
    }

    /// Arguments for `steampipe check`
    fn build_args(&self, benchmark_id: &str, output_path: &Path) -> Vec<String> {
        vec![
            "check".to_string(),
            "--progress=false".to_string(),
            "--output=none".to_string(),
            format!("--export={}", output_path.display()),
            benchmark_id.to_string(),
        ]
    }
}

impl BenchmarkRunner for SteampipeRunner {
    fn run_benchmark(
        &self,
        benchmark_id: &str,
        output_path: &Path,
    ) -> Result<BenchmarkOutput, CommandError> {
        let args = self.build_args(benchmark_id, output_path);
        let args_str: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

        log::info!(
            "Running {} {} in {}",
            self.binary,
            args.join(" "),
            self.mod_path.display()
        );

        let output = self
            .executor
            .execute(&self.binary, &args_str, Some(&self.mod_path), None)?;

        log::info!(
            "Benchmark {} finished with exit code {} after {:.1}s",
            benchmark_id,
            output.exit_code,
            output.duration.as_secs_f64()
        );

        Ok(BenchmarkOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
        })
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

    #[test]
    fn test_build_args() {
        let runner = SteampipeRunner::new("steampipe", "/opt/mod", None);
        let args = runner.build_args("benchmark.nsa_cisa_v1", Path::new("/tmp/abc.json"));

        assert_eq!(
            args,
            vec![
                "check",
                "--progress=false",
                "--output=none",
                "--export=/tmp/abc.json",
                "benchmark.nsa_cisa_v1",
            ]
        );
    }

    #[test]
    fn test_from_config() {
        let config = AgentConfig {
            steampipe_binary: "/usr/local/bin/steampipe".to_string(),
            mod_path: PathBuf::from("/srv/mod"),
            evaluator_timeout_secs: Some(60),
            ..AgentConfig::default()
        };
        let runner = SteampipeRunner::from_config(&config);

        assert_eq!(runner.binary, "/usr/local/bin/steampipe");
        assert_eq!(runner.mod_path, PathBuf::from("/srv/mod"));
        assert!(runner.executor.is_allowed("/usr/local/bin/steampipe"));
        assert_eq!(
            runner.executor.default_timeout(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_missing_binary_is_a_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SteampipeRunner::new("/nonexistent/steampipe", dir.path(), None);

        let result = runner.run_benchmark("benchmark.nsa_cisa_v1", &dir.path().join("out.json"));
        assert!(matches!(result, Err(CommandError::ProgramNotFound { .. })));
    }
}
