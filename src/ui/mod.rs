//! User interface module - progress and result lines.
//!
//! `Reporter` decides whether lines are shown at all: when the changelog
//! itself goes to stdout, progress would corrupt it.

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_error, display_status, display_success, format_bytes,
    written_message,
};

use crate::boundary::BoundaryWarning;

/// Prints progress for one run, or nothing when quiet
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Reporter { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn status(&self, message: &str) {
        if !self.quiet {
            display_status(message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            display_success(message);
        }
    }

    /// Warnings go to stderr and are shown even when quiet.
    pub fn warning(&self, warning: &BoundaryWarning) {
        display_boundary_warning(warning);
    }
}
