//! Release assembly: one release per tag, built from that tag's commits

use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::config::{Options, SortCommits};
use crate::domain::commit::{Commit, Merge};
use crate::domain::release::{FixEntry, Release};
use crate::domain::tag::Tag;
use crate::domain::version;
use crate::error::{ChangelogError, Result};
use crate::patterns::Patterns;

/// Commits of one release split by what they represent
///
/// Every commit lands in exactly one list; merges win over fixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub plain: Vec<Commit>,
    pub fixes: Vec<FixEntry>,
    pub merges: Vec<Merge>,
}

impl Partition {
    pub fn from_commits(commits: Vec<Commit>) -> Self {
        commits.into_iter().fold(Partition::default(), |mut acc, mut commit| {
            if let Some(merge) = commit.merge.take() {
                acc.merges.push(merge);
            } else if let Some(fixes) = commit.fixes.clone() {
                acc.fixes.push(FixEntry { fixes, commit });
            } else {
                acc.plain.push(commit);
            }
            acc
        })
    }

    pub fn len(&self) -> usize {
        self.plain.len() + self.fixes.len() + self.merges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Text after the first line of a message, if there is any.
pub fn summary(message: &str) -> Option<String> {
    let (_, rest) = message.split_once('\n')?;
    let rest = rest.trim_start_matches('\n');
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Cut the newest-first commit lists just after the starting commit.
///
/// Lists older than the one holding the commit are dropped entirely.
pub fn apply_starting_commit(lists: &mut Vec<Vec<Commit>>, starting: &str) -> Result<()> {
    for (i, commits) in lists.iter_mut().enumerate() {
        if let Some(j) = commits.iter().position(|c| c.matches_hash(starting)) {
            commits.truncate(j + 1);
            lists.truncate(i + 1);
            return Ok(());
        }
    }
    Err(ChangelogError::StartingCommitNotFound(starting.to_string()))
}

/// Concatenate release passes and keep the first release per tag.
///
/// With `sort` the result is reordered newest first by [`compare_releases`];
/// otherwise the pass order is kept.
pub fn merge_releases(passes: Vec<Vec<Release>>, sort: bool) -> Vec<Release> {
    let mut seen = HashSet::new();
    let mut releases: Vec<Release> = passes
        .into_iter()
        .flatten()
        .filter(|release| seen.insert(release.tag.clone()))
        .collect();
    if sort {
        releases.sort_by(compare_releases);
    }
    releases
}

/// Newest first: the unreleased entry, then by version, then numeric tag
/// names, then names in reverse lexicographic order.
pub fn compare_releases(a: &Release, b: &Release) -> Ordering {
    let (tag_a, tag_b) = match (&a.tag, &b.tag) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(tag_a), Some(tag_b)) => (tag_a, tag_b),
    };
    let version_a = a.version.as_deref().and_then(version::parse_loose);
    let version_b = b.version.as_deref().and_then(version::parse_loose);
    match (version_a, version_b) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => match (tag_a.parse::<u64>(), tag_b.parse::<u64>()) {
            (Ok(na), Ok(nb)) => nb.cmp(&na),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => tag_b.cmp(tag_a),
        },
    }
}

pub struct ReleaseAssembler<'a> {
    options: &'a Options,
    patterns: &'a Patterns,
}

impl<'a> ReleaseAssembler<'a> {
    pub fn new(options: &'a Options, patterns: &'a Patterns) -> Self {
        ReleaseAssembler { options, patterns }
    }

    /// Fetch every tag's commits in parallel and build the releases in tag order.
    pub fn assemble<F>(&self, tags: &[Tag], fetch: F) -> Result<Vec<Release>>
    where
        F: Fn(&Tag) -> Result<Vec<Commit>> + Sync,
    {
        let mut lists = tags
            .par_iter()
            .map(|tag| fetch(tag))
            .collect::<Result<Vec<_>>>()?;

        if let Some(starting) = &self.options.starting_commit {
            apply_starting_commit(&mut lists, starting)?;
        }

        let releases: Vec<Release> = tags
            .iter()
            .zip(lists)
            .map(|(tag, commits)| self.release(tag, commits))
            .filter(|release| !(self.options.hide_empty_releases && release.is_empty()))
            .collect();
        debug!(releases = releases.len(), "assembled releases");
        Ok(releases)
    }

    /// Build the release for one tag from its commits, newest first.
    pub fn release(&self, tag: &Tag, commits: Vec<Commit>) -> Release {
        let summary = match (&tag.tag, commits.first()) {
            (Some(_), Some(first)) if self.options.release_summary => summary(&first.message),
            _ => None,
        };

        let Partition {
            plain,
            fixes,
            merges,
        } = Partition::from_commits(commits);

        let mut kept: Vec<Commit> = plain
            .into_iter()
            .filter(|commit| self.keep(commit, &merges))
            .collect();
        kept.sort_by(|a, b| self.compare(a, b));

        let empty = fixes.is_empty() && merges.is_empty();
        let limit = if empty {
            self.options.backfill_limit
        } else {
            self.options.commit_limit
        };
        let breaking = kept.iter().filter(|c| c.breaking).count();
        if let Some(max) = limit.at_least(breaking) {
            kept.truncate(max);
        }

        Release {
            tag: tag.tag.clone(),
            version: tag.version.clone(),
            title: tag.title.clone(),
            date: tag.date.clone(),
            iso_date: tag.iso_date.clone(),
            nice_date: tag.nice_date.clone(),
            commits: kept,
            fixes,
            merges,
            summary,
            major: tag.major,
            minor: tag.minor,
            href: tag.href.clone(),
        }
    }

    /// Whether a plain commit is worth listing.
    fn keep(&self, commit: &Commit, merges: &[Merge]) -> bool {
        if commit.breaking {
            return true;
        }
        let subject = commit.subject.as_str();
        if let Some(ignore) = &self.patterns.ignore_commit {
            if ignore.is_match(subject) {
                return false;
            }
        }
        if let Some(wanted) = &self.patterns.commit {
            if !wanted.is_match(subject) {
                return false;
            }
        }
        !version::is_valid(subject)
            && !self.patterns.merge_commit.is_match(subject)
            && !merges.iter().any(|merge| merge.message == subject)
    }

    fn compare(&self, a: &Commit, b: &Commit) -> Ordering {
        b.breaking.cmp(&a.breaking).then_with(|| match self.options.sort_commits {
            SortCommits::Relevance => b.churn().cmp(&a.churn()),
            SortCommits::Date => a.date.cmp(&b.date),
            SortCommits::DateDesc => b.date.cmp(&a.date),
            SortCommits::Subject => a.subject.cmp(&b.subject),
            SortCommits::SubjectDesc => b.subject.cmp(&a.subject),
        })
    }
}
