use serde::Serialize;

use crate::domain::commit::{Commit, Fix, Merge};

/// A commit that closes one or more issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixEntry {
    pub fixes: Vec<Fix>,
    pub commit: Commit,
}

/// One section of the changelog: everything between two tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub tag: Option<String>,
    /// Comparable version of the tag, used to order releases across passes
    #[serde(skip)]
    pub version: Option<String>,
    pub title: String,
    pub date: String,
    pub iso_date: String,
    pub nice_date: String,
    pub commits: Vec<Commit>,
    pub fixes: Vec<FixEntry>,
    pub merges: Vec<Merge>,
    pub summary: Option<String>,
    pub major: bool,
    pub minor: bool,
    pub href: Option<String>,
}

impl Release {
    /// No commits, fixes or merges to show
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.fixes.is_empty() && self.merges.is_empty()
    }
}
