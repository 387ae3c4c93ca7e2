//! Command execution with a whitelist, a scrubbed environment and an optional timeout

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// PATH given to every child process
const RESTRICTED_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// How long to keep collecting output after a timed-out child is killed.
/// Grandchildren can hold the pipes open past the kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Executes whitelisted programs and captures their output
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor {
    default_timeout: Option<Duration>,
    allowed_commands: HashSet<String>,
    inherited_env: HashSet<String>,
}

impl SystemCommandExecutor {
    /// Executor with an empty whitelist and no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with an empty whitelist and a default timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn allow_command(&mut self, command: impl Into<String>) {
        self.allowed_commands.insert(command.into());
    }

    pub fn allow_commands(&mut self, commands: &[&str]) {
        for cmd in commands {
            self.allowed_commands.insert(cmd.to_string());
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Pass these variables through from the agent's environment, when set
    pub fn inherit_env(&mut self, names: &[&str]) {
        for name in names {
            self.inherited_env.insert(name.to_string());
        }
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Run a program to completion and capture stdout/stderr
    ///
    /// `timeout` overrides the executor default. With neither set the call
    /// blocks until the program exits.
    pub fn execute(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.allowed_commands.contains(program) {
            return Err(CommandError::SecurityViolation {
                reason: format!("Command '{}' not in whitelist", program),
            });
        }

        let timeout = timeout.or(self.default_timeout);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .env("PATH", RESTRICTED_PATH)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for name in &self.inherited_env {
            if let Some(value) = std::env::var_os(name) {
                cmd.env(name, value);
            }
        }

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CommandError::ProgramNotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => CommandError::PermissionDenied {
                program: program.to_string(),
            },
            _ => CommandError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            },
        })?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = wait_for_exit(&mut child, timeout).map_err(|e| {
            CommandError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = match status {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                let deadline = Instant::now() + DRAIN_GRACE;
                return Err(CommandError::Timeout {
                    timeout_ms: timeout.map(|t| t.as_millis() as u64).unwrap_or_default(),
                    stdout: drain_until(stdout_reader, deadline),
                    stderr: drain_until(stderr_reader, deadline),
                });
            }
        };

        Ok(CommandOutput {
            stdout: drain(stdout_reader),
            stderr: drain(stderr_reader),
            exit_code: status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }
}

fn wait_for_exit(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    match timeout {
        Some(timeout) => wait_timeout::ChildExt::wait_timeout(child, timeout),
        None => child.wait().map(Some),
    }
}

/// Background thread copying one pipe into a shared buffer
///
/// Output is appended as it arrives, so whatever was printed before a kill
/// can still be read when the pipe never reaches EOF.
struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

fn buffer_contents(buffer: &Mutex<Vec<u8>>) -> String {
    let buffer = buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&buffer).into_owned()
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<PipeReader>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Some(read) = chunk.get(..n) {
                            sink.lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner())
                                .extend_from_slice(read);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
        PipeReader { buffer, handle }
    })
}

/// Wait for EOF and return everything read
fn drain(reader: Option<PipeReader>) -> String {
    match reader {
        Some(PipeReader { buffer, handle }) => {
            let _ = handle.join();
            buffer_contents(&buffer)
        }
        None => String::new(),
    }
}

/// Return what was read by `deadline`, EOF or not
fn drain_until(reader: Option<PipeReader>, deadline: Instant) -> String {
    match reader {
        Some(reader) => {
            while !reader.handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            buffer_contents(&reader.buffer)
        }
        None => String::new(),
    }
}

/// Command execution output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

/// Command execution errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Execution failed for '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    /// Carries whatever the program printed before it was killed
    #[error("Command timed out after {timeout_ms}ms")]
    Timeout {
        timeout_ms: u64,
        stdout: String,
        stderr: String,
    },

    #[error("Permission denied: {program}")]
    PermissionDenied { program: String },

    #[error("Security violation: {reason}")]
    SecurityViolation { reason: String },
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
