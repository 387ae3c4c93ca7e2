//! Command execution for the benchmark evaluator
//!
//! Provides a whitelisted command executor and the configuration used to run
//! steampipe benchmarks.

pub mod executor;
pub mod steampipe;

pub use executor::{CommandError, CommandOutput, SystemCommandExecutor};
pub use steampipe::create_steampipe_command_executor;
