//! Pure formatting functions for terminal output.
//!
//! All display logic lives here, separated from control flow, so the
//! orchestration code stays silent and testable.

use crate::orchestrator::RunSummary;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print the per-package outcome of a run.
///
/// Successful packages show their new tag; failed ones show the state they
/// reached and the error that stopped them.
pub fn display_run_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        let tag = outcome.new_tag.as_deref().unwrap_or("-");
        match &outcome.error {
            None => display_success(&format!("{}: released {}", outcome.package, tag)),
            Some(error) => display_error(&format!(
                "{}: failed after '{}': {}",
                outcome.package, outcome.state, error
            )),
        }
    }
    if let Some(error) = &summary.push_error {
        display_error(&format!("push failed: {}", error));
    }
}
