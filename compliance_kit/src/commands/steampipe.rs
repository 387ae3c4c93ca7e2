//! Steampipe command executor configuration
//!
//! Provides a whitelisted command executor for running compliance benchmarks.

use super::SystemCommandExecutor;
use std::time::Duration;

/// Environment the evaluator needs to find its install and reach the cluster
const STEAMPIPE_ENV: &[&str] = &[
    "HOME",
    "STEAMPIPE_INSTALL_DIR",
    "KUBECONFIG",
    "KUBERNETES_SERVICE_HOST",
    "KUBERNETES_SERVICE_PORT",
];

/// Create command executor configured for benchmark runs
///
/// Whitelist includes the configured binary plus the usual install locations.
/// No default timeout: a full benchmark run can take a long time, so the
/// caller decides.
pub fn create_steampipe_command_executor(
    binary: &str,
    timeout: Option<Duration>,
) -> SystemCommandExecutor {
    let mut executor = match timeout {
        Some(timeout) => SystemCommandExecutor::with_timeout(timeout),
        None => SystemCommandExecutor::new(),
    };

    executor.allow_command(binary);
    executor.allow_commands(&[
        "steampipe",                // Standard PATH lookup
        "/usr/local/bin/steampipe", // Default install location
    ]);
    executor.inherit_env(STEAMPIPE_ENV);

    executor
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
    fn test_whitelists_configured_binary() {
        let executor = create_steampipe_command_executor("/opt/bin/steampipe", None);

        assert!(executor.is_allowed("/opt/bin/steampipe"));
        assert!(executor.is_allowed("steampipe"));
        assert!(!executor.is_allowed("kubectl"));
        assert!(executor.default_timeout().is_none());
    }

    #[test]
    fn test_timeout_is_applied() {
        let executor =
            create_steampipe_command_executor("steampipe", Some(Duration::from_secs(600)));
        assert_eq!(executor.default_timeout(), Some(Duration::from_secs(600)));
    }
}
