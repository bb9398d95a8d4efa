use thiserror::Error;

/// Unified error type for git-changelog operations
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Git repository error: {0}")]
    Repository(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Invalid {option} pattern: {source}")]
    Pattern {
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Starting commit {0} was not found")]
    StartingCommitNotFound(String),

    #[error("Template '{0}' was not found")]
    Template(String),

    #[error("Template error: {0}")]
    Render(String),

    #[error("Failed to fetch template {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in git-changelog
pub type Result<T> = std::result::Result<T, ChangelogError>;

impl ChangelogError {
    /// Create a git error with context
    pub fn git(msg: impl Into<String>) -> Self {
        ChangelogError::Git(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ChangelogError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ChangelogError::Version(msg.into())
    }

    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ChangelogError::Parse(msg.into())
    }

    /// Wrap a regex compilation failure for the named option
    pub fn pattern(option: &'static str, source: regex::Error) -> Self {
        ChangelogError::Pattern { option, source }
    }
}
