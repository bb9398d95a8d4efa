//! Main workflow orchestration logic
//!
//! Runs the whole pipeline against any [Repository]: resolve the remote,
//! list tags, fetch and parse each tag's commits, assemble releases and
//! render them. Writing the result is a separate step so nothing touches the
//! output file until rendering has succeeded.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::commits::{self, CommitParser};
use crate::config::{self, Options};
use crate::domain::release::Release;
use crate::domain::version;
use crate::error::{ChangelogError, Result};
use crate::git::Repository;
use crate::patterns::Patterns;
use crate::releases::{self, ReleaseAssembler};
use crate::remote::Remote;
use crate::tags::TagFetcher;
use crate::template;
use crate::ui::Reporter;

/// Marks where generated content ends in an existing changelog.
pub const PREPEND_TOKEN: &str = "<!-- auto-changelog-above -->";

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct Changelog {
    /// The rendered document
    pub text: String,

    /// Releases the document was rendered from
    pub releases: Vec<Release>,

    /// Degraded-mode conditions met along the way
    pub warnings: Vec<BoundaryWarning>,
}

/// Use the package manifest version as the latest version when asked to.
///
/// An explicit `latest_version` wins over the manifest.
pub fn apply_package_version(options: &mut Options) -> Result<()> {
    if options.latest_version.is_some() {
        return Ok(());
    }
    if let Some(path) = &options.package {
        let package_version = config::read_package_version(path)?;
        if !version::is_valid(&package_version) {
            return Err(ChangelogError::version(format!(
                "Version '{}' in {} is not a valid semver version",
                package_version, path
            )));
        }
        debug!(version = %package_version, "using package version");
        options.latest_version = Some(package_version);
    }
    Ok(())
}

/// Build the changelog text.
///
/// `now` dates the unreleased entry.
pub fn build_changelog<R: Repository>(
    repo: &R,
    options: &Options,
    now: DateTime<Utc>,
    reporter: &Reporter,
) -> Result<Changelog> {
    let patterns = Patterns::compile(options)?;
    let mut warnings = Vec::new();

    let remote_url = repo.remote_url(&options.remote)?;
    let remote = Remote::resolve(remote_url.as_deref(), options);
    if remote.host().is_none() && !remote.overrides().is_complete() {
        let warning = BoundaryWarning::RemoteNotFound {
            remote: options.remote.clone(),
        };
        reporter.warning(&warning);
        warnings.push(warning);
    }

    let git_version = repo.git_version()?;
    let log_format = commits::log_format(git_version.as_ref());
    debug!(git_version = ?git_version, "selected log format");

    let mut passes = vec![release_pass(
        repo, options, &patterns, &remote, &log_format, None, now, reporter,
    )?];
    if passes[0].tag_count == 0 {
        reporter.warning(&BoundaryWarning::NoVersionTags);
        warnings.push(BoundaryWarning::NoVersionTags);
    }

    // The starting commit bounds the main history only
    let branch_options = Options {
        starting_commit: None,
        ..options.clone()
    };
    for branch in &options.include_branch {
        passes.push(release_pass(
            repo,
            &branch_options,
            &patterns,
            &remote,
            &log_format,
            Some(branch.as_str()),
            now,
            reporter,
        )?);
    }

    // A single pass is already ordered, and a git-side sort is kept as given
    let sort = passes.len() > 1 && !options.append_git_tag.contains("--sort");
    let releases =
        releases::merge_releases(passes.into_iter().map(|p| p.releases).collect(), sort);
    info!(releases = releases.len(), template = %options.template, "rendering changelog");
    let text = template::render(&options.template, &releases, options)?;

    Ok(Changelog {
        text,
        releases,
        warnings,
    })
}

struct Pass {
    tag_count: usize,
    releases: Vec<Release>,
}

/// Tags and releases for the main history or one included branch.
#[allow(clippy::too_many_arguments)]
fn release_pass<R: Repository>(
    repo: &R,
    options: &Options,
    patterns: &Patterns,
    remote: &Remote,
    log_format: &str,
    branch: Option<&str>,
    now: DateTime<Utc>,
    reporter: &Reporter,
) -> Result<Pass> {
    reporter.status("Fetching tags…");
    let listing = repo.list_tags(branch, &options.append_git_tag)?;
    let tags = TagFetcher::new(options, patterns, remote).parse_tags(&listing, now)?;
    let tag_count = tags.iter().filter(|t| t.tag.is_some()).count();
    reporter.status(&format!("{} version tags found…", tag_count));

    let parser = CommitParser::new(patterns, remote, &options.tag_prefix);
    let releases = ReleaseAssembler::new(options, patterns).assemble(&tags, |tag| {
        let log = repo.log(&tag.diff, log_format, &options.append_git_log)?;
        let commits = parser.parse_commits(&log)?;
        debug!(range = %tag.diff, commits = commits.len(), "parsed commits");
        reporter.status(&format!("Fetched {}…", tag.title));
        Ok(commits)
    })?;

    Ok(Pass {
        tag_count,
        releases,
    })
}

/// New changelog text combined with what the output file already holds.
pub fn compose_output(changelog: &str, existing: Option<&str>, prepend: bool) -> String {
    match existing {
        Some(existing) if prepend => format!("{}{}", changelog, existing),
        Some(existing) => match existing.find(PREPEND_TOKEN) {
            Some(index) => format!("{}{}", changelog, &existing[index..]),
            None => changelog.to_string(),
        },
        None => changelog.to_string(),
    }
}

/// Write the changelog to stdout or the output file; returns its size in bytes.
pub fn write_output(changelog: &str, options: &Options) -> Result<usize> {
    if options.stdout {
        print!("{}", changelog);
        return Ok(changelog.len());
    }

    let path = Path::new(&options.output);
    let existing = if path.exists() {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };
    fs::write(
        path,
        compose_output(changelog, existing.as_deref(), options.prepend),
    )?;
    Ok(changelog.len())
}
