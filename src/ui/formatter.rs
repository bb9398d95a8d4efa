//! Pure formatting functions for UI output.
//!
//! Everything printed for the user goes through here; diagnostics go through
//! `tracing` instead.

use console::style;

use crate::boundary::BoundaryWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Size in whole kilobytes, never below 1, e.g. `4 kB`.
pub fn format_bytes(bytes: usize) -> String {
    let kilobytes = (bytes as f64 / 1024.0).round().max(1.0);
    format!("{} kB", kilobytes as u64)
}

/// Status line printed once the changelog has been written.
pub fn written_message(bytes: usize, output: &str) -> String {
    format!("{} written to {}", format_bytes(bytes), output)
}
