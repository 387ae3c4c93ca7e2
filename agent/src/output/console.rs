//! Console output formatting
//!
//! Provides formatted console output for scan results.

use compliance_kit::{ComplianceSummary, ScanError, ScanOutcome, ScanRequest};

/// Print the scan header before the evaluator starts
pub fn print_scan_header(request: &ScanRequest) {
    println!();
    println!("Kubernetes Compliance Agent v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "Scan {} ({} -> {}) on {}",
        request.scan_id(),
        request.scan_type(),
        request.benchmark_id(),
        display_node(request)
    );
    println!("Running benchmark, this can take several minutes...");
    println!();
}

/// Print a completed scan in a human-readable format
pub fn print_outcome(request: &ScanRequest, outcome: &ScanOutcome) {
    let green = "\x1b[32m";
    let reset = "\x1b[0m";

    println!("┌───────────────────────────────────────────────────────────────────────────────┐");
    println!("│ Scan: {}", request.scan_id());
    println!("├───────────────────────────────────────────────────────────────────────────────┤");
    println!("│ Status:      {}✓ COMPLETED{}", green, reset);
    println!("│ Benchmark:   {}", request.benchmark_id());
    println!("│ Node:        {}", display_node(request));
    println!(
        "│ Ingested:    {}/{} documents",
        outcome.documents_ingested,
        outcome.total_checks()
    );
    if let Some(error) = &outcome.ingestion_error {
        println!("│ Ingestion:   \x1b[33m{}{}", error, reset);
    }
    println!("└───────────────────────────────────────────────────────────────────────────────┘");
    println!();

    print_summary_table(&outcome.summary);
}

/// Print a failed scan
pub fn print_failure(request: &ScanRequest, error: &ScanError) {
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("┌───────────────────────────────────────────────────────────────────────────────┐");
    println!("│ Scan: {}", request.scan_id());
    println!("├───────────────────────────────────────────────────────────────────────────────┤");
    println!("│ Status:      {}✗ FAILED{}", red, reset);
    println!("│ Benchmark:   {}", request.benchmark_id());
    println!("│ Node:        {}", display_node(request));
    println!("├───────────────────────────────────────────────────────────────────────────────┤");
    for line in error.to_string().lines().take(10) {
        let truncated = if line.chars().count() > 74 {
            format!("{}...", line.chars().take(71).collect::<String>())
        } else {
            line.to_string()
        };
        println!("│   {}", truncated);
    }
    println!("└───────────────────────────────────────────────────────────────────────────────┘");
    println!();
}

/// Print summary table
fn print_summary_table(summary: &ComplianceSummary) {
    println!("╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                                 SUMMARY                                       ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════════╣");
    println!("║                                                                               ║");
    println!(
        "║   Total Checks:  {:5}                                                        ║",
        summary.total_checks()
    );
    println!("║   \x1b[32mOk:\x1b[0m            {:5}                                                        ║", summary.ok);
    println!("║   \x1b[31mAlarm:\x1b[0m         {:5}                                                        ║", summary.alarm);
    println!("║   Info:          {:5}                                                        ║", summary.info);
    println!("║   Skip:          {:5}                                                        ║", summary.skip);
    println!("║   \x1b[33mError:\x1b[0m         {:5}                                                        ║", summary.error);
    println!("║                                                                               ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════════╣");
    println!(
        "║   Compliance Score: {:5.1}%                                                   ║",
        compliance_score(summary)
    );
    println!("╚═══════════════════════════════════════════════════════════════════════════════╝");
    println!();
}

/// Share of evaluated checks (ok + alarm) that passed
pub fn compliance_score(summary: &ComplianceSummary) -> f64 {
    let evaluated = summary.ok + summary.alarm;
    if evaluated == 0 {
        0.0
    } else {
        (summary.ok as f64 / evaluated as f64) * 100.0
    }
}

fn display_node(request: &ScanRequest) -> String {
    match (request.node_name(), request.node_id()) {
        ("", "") => "(unnamed node)".to_string(),
        (name, "") => name.to_string(),
        ("", id) => id.to_string(),
        (name, id) => format!("{} ({})", name, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_score() {
        let summary = ComplianceSummary {
            ok: 3,
            alarm: 1,
            skip: 10,
            ..ComplianceSummary::default()
        };
        assert!((compliance_score(&summary) - 75.0).abs() < f64::EPSILON);
        assert_eq!(compliance_score(&ComplianceSummary::default()), 0.0);
    }
}
