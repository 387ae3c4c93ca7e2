//! # Kubernetes Compliance Agent
//!
//! Runs a compliance benchmark against the cluster, reports the scan
//! lifecycle and ingests one document per check result.
//!
//! ## Usage
//!
//! ```bash
//! # Run the default benchmark
//! compliance_agent --scan-id 4f1c2a
//!
//! # Deliver records to files and keep a summary
//! compliance_agent --scan-id 4f1c2a -o /var/lib/compliance --summary summary.json
//!
//! # Use a config file
//! compliance_agent --config /etc/compliance/agent.toml --scan-id 4f1c2a
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`, `warn` with `--quiet`).

mod cli;
mod config;
mod output;
mod scanner;

use clap::Parser;

use cli::Cli;
use config::exit_code;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let code = match cli.into_scan_config() {
        Ok(config) => match scanner::run_scan(&config) {
            Ok(code) => code,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("Error: {}", e);
                exit_code::ERROR
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code::ERROR
        }
    };

    std::process::exit(code);
}
