//! Regular expressions used while parsing, compiled once per run
//!
//! User-supplied patterns are validated here so a bad option is reported
//! before any git output is read.

use regex::Regex;

use crate::config::Options;
use crate::error::{ChangelogError, Result};

/// Closing keywords followed by `#123` or an issue/PR URL.
pub const DEFAULT_FIX_PATTERN: &str = r"(?i)(?:close[sd]?|fixe?[sd]?|resolve[sd]?)\s(?:#(\d+)|(https?://.+?/(?:issues|pull|pull-requests|merge_requests)/(\d+)))";

/// Merge conventions, tried in this order.
pub const MERGE_PATTERNS: [&str; 4] = [
    // GitHub merge commit
    r"^Merge pull request #(\d+) from .+\n\n(.+)",
    // GitHub squash merge
    r"^(.+) \(#(\d+)\)(?:$|\n\n)",
    // BitBucket
    r"^Merged in .+ \(pull request #(\d+)\)\n\n(.+)",
    // GitLab
    r"^Merge branch .+ into .+\n\n(.+)[\S\s]+See merge request [^!]*!(\d+)",
];

/// Automatic merges git writes when pulling, never worth listing.
pub const MERGE_COMMIT_PATTERN: &str = r"^Merge (remote-tracking )?branch '.+'";

#[derive(Debug, Clone)]
pub struct Patterns {
    pub issue: Regex,
    pub merge: Vec<Regex>,
    pub merge_commit: Regex,
    pub breaking: Option<Regex>,
    pub ignore_commit: Option<Regex>,
    pub commit: Option<Regex>,
    pub tag: Option<Regex>,
    pub tag_parser: Option<(Regex, String)>,
    pub replace_text: Vec<(Regex, String)>,
}

fn compile(option: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ChangelogError::pattern(option, source))
}

fn compile_optional(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern.map(|p| compile(option, p)).transpose()
}

impl Patterns {
    pub fn compile(options: &Options) -> Result<Self> {
        let issue = compile(
            "issuePattern",
            options.issue_pattern.as_deref().unwrap_or(DEFAULT_FIX_PATTERN),
        )?;

        let mut merge = MERGE_PATTERNS
            .iter()
            .map(|p| compile("mergePattern", p))
            .collect::<Result<Vec<_>>>()?;
        if let Some(custom) = options.merge_pattern.as_deref() {
            merge.push(compile("mergePattern", custom)?);
        }

        let tag_parser = match (
            options.tag_parser_pattern.as_deref(),
            options.tag_parser_replacement.as_deref(),
        ) {
            (Some(pattern), Some(replacement)) => Some((
                compile("tagParserPattern", pattern)?,
                replacement.to_string(),
            )),
            (None, None) => None,
            _ => {
                return Err(ChangelogError::config(
                    "tagParserPattern and tagParserReplacement must be set together",
                ))
            }
        };

        let replace_text = options
            .replace_text
            .iter()
            .map(|(pattern, replacement)| {
                Ok((compile("replaceText", pattern)?, replacement.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Patterns {
            issue,
            merge,
            merge_commit: compile("mergeCommit", MERGE_COMMIT_PATTERN)?,
            breaking: compile_optional("breakingPattern", options.breaking_pattern.as_deref())?,
            ignore_commit: compile_optional(
                "ignoreCommitPattern",
                options.ignore_commit_pattern.as_deref(),
            )?,
            commit: compile_optional("commitPattern", options.commit_pattern.as_deref())?,
            tag: compile_optional("tagPattern", options.tag_pattern.as_deref())?,
            tag_parser,
            replace_text,
        })
    }

    /// Apply every `replaceText` substitution in order.
    pub fn replace_text(&self, text: &str) -> String {
        self.replace_text
            .iter()
            .fold(text.to_string(), |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }

    /// Whether the message matches the configured breaking-change pattern.
    pub fn is_breaking(&self, message: &str) -> bool {
        self.breaking
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(message))
    }
}
