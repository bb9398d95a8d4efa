//! Git access abstraction
//!
//! The changelog only ever reads from git: the tool version, a tag listing,
//! commit logs over revision ranges and the URL of a remote. The [Repository]
//! trait exposes exactly those reads so the pipeline can run against a real
//! checkout ([SystemGit]) or canned output ([MockRepository]).
//!
//! ```rust
//! # use git_changelog::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> git_changelog::error::Result<()> {
//! let listing = repo.list_tags(None, "")?;
//! let log = repo.log("v1.0.0..v1.1.0", "%H", "")?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::SystemGit;

use crate::error::Result;
use semver::Version;

/// Read-only git operations needed to build a changelog
///
/// Implementors must be `Send + Sync`: commit logs for different tags are
/// requested from several threads at once.
pub trait Repository: Send + Sync {
    /// Version of the installed git, `None` when it cannot be determined.
    fn git_version(&self) -> Result<Option<Version>>;

    /// Raw `git tag -l` output in the tag listing format.
    ///
    /// With a `branch`, only tags merged into it are listed. `extra_args` is
    /// appended verbatim (whitespace separated).
    fn list_tags(&self, branch: Option<&str>, extra_args: &str) -> Result<String>;

    /// Raw `git log --shortstat` output for a revision range.
    fn log(&self, range: &str, format: &str, extra_args: &str) -> Result<String>;

    /// URL of the named remote, `None` when it is not configured.
    fn remote_url(&self, name: &str) -> Result<Option<String>>;
}
