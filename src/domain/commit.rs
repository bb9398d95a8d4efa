use serde::Serialize;

/// Length of the abbreviated hash shown in changelogs
pub const SHORT_HASH_LEN: usize = 7;

/// An issue or pull request closed by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub id: String,
    pub href: Option<String>,
    pub author: String,
}

/// A pull/merge request recognised in a commit message
///
/// Carries a copy of the commit it came from (with `merge` left empty) so
/// templates can reach the author, hash and breaking flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Merge {
    pub id: String,
    pub message: String,
    pub href: Option<String>,
    pub author: String,
    pub commit: Box<Commit>,
}

/// One parsed commit from the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    #[serde(rename = "shorthash")]
    pub short_hash: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub tag: Option<String>,
    pub subject: String,
    pub message: String,
    pub fixes: Option<Vec<Fix>>,
    pub merge: Option<Merge>,
    pub href: Option<String>,
    pub breaking: bool,
    pub files: u32,
    pub insertions: u32,
    pub deletions: u32,
}

impl Commit {
    /// Abbreviate a full hash
    pub fn shorten(hash: &str) -> String {
        hash.chars().take(SHORT_HASH_LEN).collect()
    }

    /// Total changed lines, used to rank commits by relevance
    pub fn churn(&self) -> u32 {
        self.insertions + self.deletions
    }

    /// Whether the full hash starts with the given prefix
    pub fn matches_hash(&self, prefix: &str) -> bool {
        self.hash.starts_with(prefix)
    }
}
