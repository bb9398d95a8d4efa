//! Command-line workflow, independent of argument parsing

pub mod orchestration;

pub use orchestration::{apply_package_version, build_changelog, write_output, Changelog};
