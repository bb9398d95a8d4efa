//! Commit parsing from `git log` output
//!
//! The log is requested with a fixed pretty format framed by two sentinels:
//! one starts every commit, the other ends its message so the `--shortstat`
//! line that git appends can be told apart from the body.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

use crate::domain::commit::{Commit, Fix, Merge};
use crate::domain::version;
use crate::error::{ChangelogError, Result};
use crate::patterns::Patterns;
use crate::remote::Remote;

pub const COMMIT_SEPARATOR: &str = "__AUTO_CHANGELOG_COMMIT_SEPARATOR__";
pub const MESSAGE_SEPARATOR: &str = "__AUTO_CHANGELOG_MESSAGE_SEPARATOR__";

/// Raw body, only understood by git 1.7.2 and later
pub const BODY_FORMAT: &str = "%B";
pub const FALLBACK_BODY_FORMAT: &str = "%s%n%n%b";
pub const MIN_BODY_FORMAT_VERSION: Version = Version::new(1, 7, 2);

/// Subject used when a commit has no message at all
pub const NO_COMMIT_MESSAGE: &str = "_No commit message_";

fn header_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(.*)\n(?:\s\((.*)\))?\n(.*)\n(.*)\n(.*)\n([\S\s]+)").expect("static pattern")
    })
}

fn stats_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+) files? changed(?:, (\d+) insertions?...)?(?:, (\d+) deletions?...)?")
            .expect("static pattern")
    })
}

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("static pattern"))
}

/// Extract `X.Y.Z` from `git --version` output.
pub fn git_version(output: &str) -> Option<Version> {
    version_pattern()
        .find(output)
        .and_then(|m| Version::parse(m.as_str()).ok())
}

/// Pretty format passed to `git log`, picking the body placeholder by git version.
pub fn log_format(git_version: Option<&Version>) -> String {
    let body = match git_version {
        Some(v) if *v >= MIN_BODY_FORMAT_VERSION => BODY_FORMAT,
        _ => FALLBACK_BODY_FORMAT,
    };
    format!(
        "{}%H%n%d%n%ai%n%an%n%ae%n{}{}",
        COMMIT_SEPARATOR, body, MESSAGE_SEPARATOR
    )
}

/// First non-blank line of the message, or a placeholder.
pub fn subject(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(NO_COMMIT_MESSAGE)
        .to_string()
}

/// `(files, insertions, deletions)` from a `--shortstat` line, zero when absent.
pub fn stats(text: &str) -> (u32, u32, u32) {
    let Some(caps) = stats_pattern().captures(text) else {
        return (0, 0, 0);
    };
    let count = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    (count(1), count(2), count(3))
}

fn encode_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn is_link(text: &str) -> bool {
    text.starts_with("http")
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// `%ai` author date to UTC ISO-8601 with milliseconds.
fn iso_timestamp(date: &str) -> Result<String> {
    DateTime::parse_from_str(date.trim(), "%Y-%m-%d %H:%M:%S %z")
        .map(|d| {
            d.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .map_err(|e| ChangelogError::parse(format!("Invalid commit date '{}': {}", date, e)))
}

/// Turns sentinel-framed log text into [`Commit`]s
pub struct CommitParser<'a> {
    patterns: &'a Patterns,
    remote: &'a Remote,
    tag_prefix: &'a str,
}

impl<'a> CommitParser<'a> {
    pub fn new(patterns: &'a Patterns, remote: &'a Remote, tag_prefix: &'a str) -> Self {
        CommitParser {
            patterns,
            remote,
            tag_prefix,
        }
    }

    /// Parse a whole log, newest commit first as git prints it.
    pub fn parse_commits(&self, log: &str) -> Result<Vec<Commit>> {
        log.split(COMMIT_SEPARATOR)
            .skip(1)
            .map(|chunk| self.parse_commit(chunk))
            .collect()
    }

    /// Parse the text following one commit separator.
    pub fn parse_commit(&self, chunk: &str) -> Result<Commit> {
        let caps = header_pattern().captures(chunk).ok_or_else(|| {
            let head: String = chunk.chars().take(60).collect();
            ChangelogError::parse(format!("Malformed commit header: {:?}", head))
        })?;
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let hash = field(1).trim().to_string();
        let author = field(4).to_string();
        let (body, stat_text) = field(6)
            .split_once(MESSAGE_SEPARATOR)
            .unwrap_or((field(6), ""));
        let message = encode_html(body);
        let (files, insertions, deletions) = stats(stat_text);

        let mut commit = Commit {
            short_hash: Commit::shorten(&hash),
            href: self.remote.commit_link(&hash),
            hash,
            email: field(5).to_string(),
            date: iso_timestamp(field(3))?,
            tag: self.tag(caps.get(2).map(|m| m.as_str())),
            subject: self.patterns.replace_text(&subject(&message)),
            message: message.trim().to_string(),
            fixes: self.fixes(&message, &author),
            merge: None,
            breaking: self.patterns.is_breaking(&message),
            author,
            files,
            insertions,
            deletions,
        };
        commit.merge = self.merge(&message, &commit);
        Ok(commit)
    }

    /// Version tag among the ref decorations, if any.
    fn tag(&self, refs: Option<&str>) -> Option<String> {
        let prefix = format!("tag: {}", self.tag_prefix);
        for entry in refs?.split(", ") {
            let Some(candidate) = entry.strip_prefix(&prefix) else {
                continue;
            };
            let name = format!("{}{}", self.tag_prefix, candidate);
            if let Some(pattern) = &self.patterns.tag {
                return pattern.is_match(&name).then_some(name);
            }
            if version::is_valid(candidate) {
                return Some(name);
            }
        }
        None
    }

    /// Issues closed by the message; `None` when there are none.
    pub fn fixes(&self, message: &str, author: &str) -> Option<Vec<Fix>> {
        let fixes: Vec<Fix> = self
            .patterns
            .issue
            .captures_iter(message)
            .filter_map(|caps| {
                let id = (0..caps.len())
                    .rev()
                    .filter_map(|i| caps.get(i))
                    .map(|m| m.as_str())
                    .find(|s| !s.is_empty())?
                    .to_string();
                let href = match caps.get(2).map(|m| m.as_str()) {
                    Some(link) if is_link(link) => Some(link.to_string()),
                    _ => self.remote.issue_link(&id),
                };
                Some(Fix {
                    id,
                    href,
                    author: author.to_string(),
                })
            })
            .collect();

        (!fixes.is_empty()).then_some(fixes)
    }

    /// First merge convention the message follows, if any.
    pub fn merge(&self, message: &str, commit: &Commit) -> Option<Merge> {
        self.patterns.merge.iter().find_map(|pattern| {
            let caps = pattern.captures(message)?;
            let first = caps.get(1)?.as_str();
            let second = caps.get(2).map_or("", |m| m.as_str());
            let (id, title) = if is_numeric(first) {
                (first, second)
            } else {
                (second, first)
            };
            Some(Merge {
                id: id.to_string(),
                message: self.patterns.replace_text(title),
                href: self.remote.merge_link(id),
                author: commit.author.clone(),
                commit: Box::new(Commit {
                    merge: None,
                    ..commit.clone()
                }),
            })
        })
    }
}
