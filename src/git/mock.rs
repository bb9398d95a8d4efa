use crate::error::{ChangelogError, Result};
use crate::git::Repository;
use semver::Version;
use std::collections::HashMap;

/// Mock repository serving canned git output
///
/// Logs are keyed by revision range, tag listings by branch (`None` for the
/// plain listing). A range without a canned log yields an empty log.
#[derive(Debug, Clone, Default)]
pub struct MockRepository {
    version: Option<Version>,
    tag_listings: HashMap<Option<String>, String>,
    logs: HashMap<String, String>,
    remotes: HashMap<String, String>,
    failing_ranges: Vec<String>,
}

impl MockRepository {
    /// Create a new empty mock repository reporting git 2.40.0
    pub fn new() -> Self {
        MockRepository {
            version: Some(Version::new(2, 40, 0)),
            ..Default::default()
        }
    }

    pub fn set_git_version(&mut self, version: Option<Version>) {
        self.version = version;
    }

    /// Set the listing returned for `git tag -l` (optionally `--merged branch`)
    pub fn set_tag_listing(&mut self, branch: Option<&str>, listing: impl Into<String>) {
        self.tag_listings
            .insert(branch.map(str::to_string), listing.into());
    }

    /// Set the log returned for a revision range
    pub fn add_log(&mut self, range: impl Into<String>, log: impl Into<String>) {
        self.logs.insert(range.into(), log.into());
    }

    pub fn add_remote(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.remotes.insert(name.into(), url.into());
    }

    /// Make `git log` fail for a revision range
    pub fn fail_range(&mut self, range: impl Into<String>) {
        self.failing_ranges.push(range.into());
    }
}

impl Repository for MockRepository {
    fn git_version(&self) -> Result<Option<Version>> {
        Ok(self.version.clone())
    }

    fn list_tags(&self, branch: Option<&str>, _extra_args: &str) -> Result<String> {
        Ok(self
            .tag_listings
            .get(&branch.map(str::to_string))
            .cloned()
            .unwrap_or_default())
    }

    fn log(&self, range: &str, _format: &str, _extra_args: &str) -> Result<String> {
        if self.failing_ranges.iter().any(|r| r == range) {
            return Err(ChangelogError::git(format!(
                "fatal: bad revision '{}'",
                range
            )));
        }
        Ok(self.logs.get(range).cloned().unwrap_or_default())
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self.remotes.get(name).cloned())
    }
}
