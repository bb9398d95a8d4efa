pub mod boundary;
pub mod cli;
pub mod commits;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod patterns;
pub mod releases;
pub mod remote;
pub mod tags;
pub mod template;
pub mod ui;

pub use error::{ChangelogError, Result};
