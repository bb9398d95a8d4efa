//! Version tags from `git tag -l` output, turned into release boundaries

use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::config::Options;
use crate::domain::tag::{self, Tag};
use crate::domain::version::{self, VersionBump};
use crate::error::{ChangelogError, Result};
use crate::patterns::Patterns;
use crate::remote::Remote;

/// Separates the tag name from its creator date in each listing line.
pub const DIVIDER: &str = "---";

/// `--format` argument for the tag listing.
pub fn tag_format() -> String {
    format!("%(refname:short){}%(creatordate:short)", DIVIDER)
}

/// Arguments after `git`, optionally restricted to tags merged into `branch`.
pub fn list_args(branch: Option<&str>, extra_args: &str) -> Vec<String> {
    let mut args = vec![
        "tag".to_string(),
        "-l".to_string(),
        format!("--format={}", tag_format()),
    ];
    if let Some(branch) = branch {
        args.push("--merged".to_string());
        args.push(branch.to_string());
    }
    args.extend(extra_args.split_whitespace().map(str::to_string));
    args
}

/// A listed tag before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawTag {
    name: String,
    date: String,
    version: Option<String>,
}

/// Builds the newest-first tag list for one listing
pub struct TagFetcher<'a> {
    options: &'a Options,
    patterns: &'a Patterns,
    remote: &'a Remote,
}

impl<'a> TagFetcher<'a> {
    pub fn new(options: &'a Options, patterns: &'a Patterns, remote: &'a Remote) -> Self {
        TagFetcher {
            options,
            patterns,
            remote,
        }
    }

    /// Parse, filter, sort, enrich and window the listing.
    ///
    /// `now` dates the synthetic unreleased entry.
    pub fn parse_tags(&self, listing: &str, now: DateTime<Utc>) -> Result<Vec<Tag>> {
        let latest_version = self.latest_version()?;

        let listed: Vec<RawTag> = listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_line(line))
            .collect();
        let total = listed.len();
        let mut raw: Vec<RawTag> = listed.into_iter().filter(|t| self.keep(t)).collect();
        if raw.len() < total {
            debug!(dropped = total - raw.len(), "ignoring tags that are not versions");
        }

        if self.options.append_git_tag.contains("--sort") {
            debug!("keeping tag order from git");
        } else {
            raw.sort_by(compare_raw);
        }

        let mut tags = self.enrich(&raw);
        if self.options.wants_unreleased() {
            let unreleased = self.unreleased(latest_version.as_deref(), tags.first(), now);
            tags.insert(0, unreleased);
        }

        Ok(self.window(tags))
    }

    fn latest_version(&self) -> Result<Option<String>> {
        match &self.options.latest_version {
            Some(latest) if !version::is_valid(latest) => Err(ChangelogError::version(
                "--latest-version must be a valid semver version",
            )),
            latest => Ok(latest.clone()),
        }
    }

    fn parse_line(&self, line: &str) -> RawTag {
        let (name, date) = line.split_once(DIVIDER).unwrap_or((line, ""));
        let mut candidate = name
            .strip_prefix(self.options.tag_prefix.as_str())
            .unwrap_or(name)
            .to_string();
        if let Some((pattern, replacement)) = &self.patterns.tag_parser {
            candidate = pattern.replace(&candidate, replacement.as_str()).into_owned();
        }
        let inferred = version::infer_semver(&candidate);
        RawTag {
            name: name.to_string(),
            date: date.trim().to_string(),
            version: version::is_valid(&inferred).then_some(inferred),
        }
    }

    fn keep(&self, raw: &RawTag) -> bool {
        match &self.patterns.tag {
            Some(pattern) => pattern.is_match(&raw.name),
            None => raw.version.is_some(),
        }
    }

    /// Diff ranges, compare links and bump flags against the next older tag.
    fn enrich(&self, raw: &[RawTag]) -> Vec<Tag> {
        raw.iter()
            .enumerate()
            .map(|(i, current)| {
                let previous = raw.get(i + 1);
                let bump = match (previous.and_then(|p| p.version.as_deref()), &current.version) {
                    (Some(older), Some(newer)) => version::diff(older, newer),
                    _ => None,
                };
                Tag {
                    tag: Some(current.name.clone()),
                    version: current.version.clone(),
                    title: current.name.clone(),
                    iso_date: tag::iso_date(&current.date),
                    nice_date: tag::nice_date(&current.date),
                    date: current.date.clone(),
                    diff: match previous {
                        Some(p) => format!("{}..{}", p.name, current.name),
                        None => current.name.clone(),
                    },
                    href: previous.and_then(|p| self.remote.compare_link(&p.name, &current.name)),
                    major: bump == Some(VersionBump::Major),
                    minor: bump == Some(VersionBump::Minor),
                }
            })
            .collect()
    }

    /// Entry for commits after the newest tag.
    fn unreleased(&self, latest: Option<&str>, previous: Option<&Tag>, now: DateTime<Utc>) -> Tag {
        let previous_version = previous.and_then(|p| p.version.as_deref());
        let title = match latest {
            Some(latest)
                if !latest.starts_with('v')
                    && previous_version.is_some_and(|v| v.starts_with('v')) =>
            {
                format!("v{}", latest)
            }
            Some(latest) => latest.to_string(),
            None => "Unreleased".to_string(),
        };
        let target = match latest {
            Some(_) => format!("{}{}", self.options.tag_prefix, title),
            None => "HEAD".to_string(),
        };
        let bump = match (previous_version, latest) {
            (Some(older), Some(newer)) => version::diff(older, newer),
            _ => None,
        };
        let date = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let previous_name = previous.and_then(|p| p.tag.as_deref());

        Tag {
            tag: None,
            version: latest.map(str::to_string),
            title,
            iso_date: tag::iso_date(&date),
            nice_date: tag::nice_date(&date),
            date,
            diff: match previous_name {
                Some(name) => format!("{}..", name),
                None => "HEAD".to_string(),
            },
            href: previous_name.and_then(|name| self.remote.compare_link(name, &target)),
            major: bump == Some(VersionBump::Major),
            minor: bump == Some(VersionBump::Minor),
        }
    }

    fn names(&self, tag: &Tag, wanted: &str) -> bool {
        tag.tag.as_deref().is_some_and(|name| {
            name == wanted || name == format!("{}{}", self.options.tag_prefix, wanted)
        })
    }

    /// Apply starting/ending bounds and unreleased-only.
    fn window(&self, mut tags: Vec<Tag>) -> Vec<Tag> {
        if let Some(starting) = &self.options.starting_version {
            let index = tags
                .iter()
                .position(|t| self.names(t, starting))
                .or_else(|| nearest_lower(&tags, starting));
            match index {
                Some(index) => tags.truncate(index + 1),
                None => debug!(starting_version = %starting, "starting version not found"),
            }
        }

        if let Some(starting) = &self.options.starting_date {
            tags.retain(|t| t.iso_date.as_str() >= starting.as_str());
        }

        if let Some(ending) = &self.options.ending_version {
            match tags.iter().position(|t| self.names(t, ending)) {
                Some(index) => {
                    tags.drain(..index);
                }
                None => debug!(ending_version = %ending, "ending version not found"),
            }
        }

        if self.options.unreleased_only {
            tags.retain(|t| t.tag.is_none());
        }
        tags
    }
}

/// Index of the newest tag strictly older than `wanted`.
fn nearest_lower(tags: &[Tag], wanted: &str) -> Option<usize> {
    let wanted = version::parse_loose(&version::infer_semver(wanted))?;
    tags.iter().position(|t| {
        t.tag.is_some()
            && t.version
                .as_deref()
                .and_then(version::parse_loose)
                .is_some_and(|v| v < wanted)
    })
}

/// Newest first: versioned tags by semver, then the rest by name.
fn compare_raw(a: &RawTag, b: &RawTag) -> Ordering {
    match (&a.version, &b.version) {
        (Some(va), Some(vb)) => version::rcompare(va, vb).then_with(|| b.name.cmp(&a.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.name.cmp(&a.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LISTING: &str = "v0.1.0---2000-02-01\n\
                           v0.2.0---2000-03-01\n\
                           v0.2.1---2000-03-03\n\
                           v0.2.2---2000-03-05\n\
                           v0.3.0---2000-04-01\n\
                           v1.0.0---2001-01-01\n";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap()
    }

    fn fetch(listing: &str, options: &Options) -> Result<Vec<Tag>> {
        let patterns = Patterns::compile(options)?;
        let remote = Remote::resolve(Some("https://github.com/user/repo"), options);
        TagFetcher::new(options, &patterns, &remote).parse_tags(listing, now())
    }

    fn names(tags: &[Tag]) -> Vec<Option<&str>> {
        tags.iter().map(|t| t.tag.as_deref()).collect()
    }

    #[test]
    fn test_list_args() {
        assert_eq!(
            list_args(Some("release"), "--sort=-creatordate"),
            vec![
                "tag",
                "-l",
                "--format=%(refname:short)---%(creatordate:short)",
                "--merged",
                "release",
                "--sort=-creatordate",
            ]
        );
        assert_eq!(list_args(None, "").len(), 3);
    }

    #[test]
    fn test_parse_tags_enriches() {
        let tags = fetch(LISTING, &Options::default()).unwrap();
        assert_eq!(
            names(&tags),
            vec![
                Some("v1.0.0"),
                Some("v0.3.0"),
                Some("v0.2.2"),
                Some("v0.2.1"),
                Some("v0.2.0"),
                Some("v0.1.0"),
            ]
        );

        let newest = &tags[0];
        assert_eq!(newest.title, "v1.0.0");
        assert_eq!(newest.date, "2001-01-01");
        assert_eq!(newest.iso_date, "2001-01-01");
        assert_eq!(newest.nice_date, "1 January 2001");
        assert_eq!(newest.diff, "v0.3.0..v1.0.0");
        assert_eq!(
            newest.href.as_deref(),
            Some("https://github.com/user/repo/compare/v0.3.0...v1.0.0")
        );
        assert!(newest.major);
        assert!(!newest.minor);

        assert!(tags[1].minor);
        assert!(!tags[2].major && !tags[2].minor);

        let oldest = &tags[5];
        assert_eq!(oldest.diff, "v0.1.0");
        assert_eq!(oldest.href, None);
    }

    #[test]
    fn test_sort_by_version_not_listing_order() {
        let tags = fetch(
            "v2.0.0---2002-01-01\nv1.0.0---2000-01-01\nv1.5.0---2001-01-01",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(
            names(&tags),
            vec![Some("v2.0.0"), Some("v1.5.0"), Some("v1.0.0")]
        );
    }

    #[test]
    fn test_sort_passthrough() {
        let options = Options {
            append_git_tag: "--sort=-creatordate".to_string(),
            ..Options::default()
        };
        let tags = fetch("v1.0.0---2002-01-01\nv2.0.0---2001-01-01", &options).unwrap();
        assert_eq!(names(&tags), vec![Some("v1.0.0"), Some("v2.0.0")]);
    }

    #[test]
    fn test_partial_semver_and_invalid_tags() {
        let tags = fetch(
            "v1---2000-01-01\nv1.1---2000-02-01\nv1.1.1---2000-03-01\nnot-a-version---2000-04-01",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(names(&tags), vec![Some("v1.1.1"), Some("v1.1"), Some("v1")]);
        assert_eq!(tags[1].version.as_deref(), Some("v1.1.0"));
        assert_eq!(tags[2].version.as_deref(), Some("v1.0.0"));
        assert!(tags[1].minor);
    }

    #[test]
    fn test_tag_prefix() {
        let options = Options {
            tag_prefix: "release-".to_string(),
            ..Options::default()
        };
        let tags = fetch(
            "release-1.0.0---2000-01-01\nrelease-2.0.0---2001-01-01\nother---2001-01-01",
            &options,
        )
        .unwrap();
        assert_eq!(names(&tags), vec![Some("release-2.0.0"), Some("release-1.0.0")]);
        assert_eq!(tags[0].version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_tag_pattern_keeps_non_semver() {
        let options = Options {
            tag_pattern: Some(r"^build-".to_string()),
            ..Options::default()
        };
        let tags = fetch("build-a---2000-01-01\nbuild-b---2000-02-01\nv1.0.0---2000-03-01", &options)
            .unwrap();
        assert_eq!(names(&tags), vec![Some("build-b"), Some("build-a")]);
        assert_eq!(tags[0].version, None);
        assert_eq!(tags[0].diff, "build-a..build-b");
    }

    #[test]
    fn test_tag_parser() {
        let options = Options {
            tag_parser_pattern: Some(r"^rel(\d+)_(\d+)$".to_string()),
            tag_parser_replacement: Some("$1.$2.0".to_string()),
            ..Options::default()
        };
        let tags = fetch("rel1_2---2000-01-01\nrel1_10---2000-02-01", &options).unwrap();
        assert_eq!(names(&tags), vec![Some("rel1_10"), Some("rel1_2")]);
        assert_eq!(tags[0].version.as_deref(), Some("1.10.0"));
    }

    #[test]
    fn test_unreleased_entry() {
        let options = Options {
            unreleased: true,
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        let unreleased = &tags[0];
        assert_eq!(unreleased.tag, None);
        assert_eq!(unreleased.title, "Unreleased");
        assert_eq!(unreleased.date, "2020-06-01T12:00:00.000Z");
        assert_eq!(unreleased.iso_date, "2020-06-01");
        assert_eq!(unreleased.diff, "v1.0.0..");
        assert_eq!(
            unreleased.href.as_deref(),
            Some("https://github.com/user/repo/compare/v1.0.0...HEAD")
        );
        assert_eq!(tags.len(), 7);
    }

    #[test]
    fn test_unreleased_without_tags() {
        let options = Options {
            unreleased: true,
            ..Options::default()
        };
        let tags = fetch("", &options).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].diff, "HEAD");
        assert_eq!(tags[0].href, None);
    }

    #[test]
    fn test_latest_version_gets_v_prefix() {
        let options = Options {
            latest_version: Some("3.0.0".to_string()),
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(tags[0].title, "v3.0.0");
        assert_eq!(tags[0].version.as_deref(), Some("3.0.0"));
        assert!(tags[0].major);
        assert_eq!(
            tags[0].href.as_deref(),
            Some("https://github.com/user/repo/compare/v1.0.0...v3.0.0")
        );
    }

    #[test]
    fn test_latest_version_must_be_semver() {
        let options = Options {
            latest_version: Some("next".to_string()),
            ..Options::default()
        };
        let err = fetch(LISTING, &options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Version error: --latest-version must be a valid semver version"
        );
    }

    #[test]
    fn test_starting_version() {
        let options = Options {
            starting_version: Some("v0.2.2".to_string()),
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(names(&tags), vec![Some("v1.0.0"), Some("v0.3.0"), Some("v0.2.2")]);
        assert_eq!(tags[2].diff, "v0.2.1..v0.2.2");
    }

    #[test]
    fn test_starting_version_falls_back_to_lower() {
        let options = Options {
            starting_version: Some("v0.2.5".to_string()),
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(names(&tags), vec![Some("v1.0.0"), Some("v0.3.0"), Some("v0.2.2")]);
    }

    #[test]
    fn test_starting_date() {
        let options = Options {
            starting_date: Some("2000-03-03".to_string()),
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(
            names(&tags),
            vec![Some("v1.0.0"), Some("v0.3.0"), Some("v0.2.2"), Some("v0.2.1")]
        );
    }

    #[test]
    fn test_ending_version() {
        let options = Options {
            ending_version: Some("v0.2.2".to_string()),
            unreleased: true,
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(
            names(&tags),
            vec![Some("v0.2.2"), Some("v0.2.1"), Some("v0.2.0"), Some("v0.1.0")]
        );

        let options = Options {
            ending_version: Some("v9.9.9".to_string()),
            ..Options::default()
        };
        assert_eq!(fetch(LISTING, &options).unwrap().len(), 6);
    }

    #[test]
    fn test_unreleased_only() {
        let options = Options {
            unreleased_only: true,
            ..Options::default()
        };
        let tags = fetch(LISTING, &options).unwrap();
        assert_eq!(names(&tags), vec![None]);
        assert_eq!(tags[0].diff, "v1.0.0..");
    }
}
