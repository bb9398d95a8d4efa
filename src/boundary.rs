use std::fmt;

/// Conditions that degrade the changelog without stopping the run.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryWarning {
    /// The configured remote does not exist or has an unrecognised URL,
    /// so no links will be generated
    RemoteNotFound { remote: String },
    /// The tag listing held no version tags
    NoVersionTags,
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::RemoteNotFound { remote } => {
                write!(
                    f,
                    "Remote '{}' not found or not recognised, changelog will have no links",
                    remote
                )
            }
            BoundaryWarning::NoVersionTags => {
                write!(f, "No version tags found")
            }
        }
    }
}
