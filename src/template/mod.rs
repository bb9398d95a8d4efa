//! Changelog renderers
//!
//! Each renderer turns the assembled releases into the final document text.
//! Besides the built-in templates, a template name may point at a Handlebars
//! file on disk or at an http(s) URL. Output is normalised so there is never more than one blank line in a row
//! and the document ends with a single newline.

mod compact;
mod custom;
mod json;
mod keepachangelog;

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::config::Options;
use crate::domain::release::Release;
use crate::error::{ChangelogError, Result};

pub const CREDIT: &str = "Generated by [`git-changelog`](https://crates.io/crates/git-changelog).";

const BREAKING_PREFIX: &str = "**Breaking change:** ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Compact,
    KeepAChangelog,
    Json,
}

impl FromStr for Template {
    type Err = ChangelogError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "compact" => Ok(Template::Compact),
            "keepachangelog" => Ok(Template::KeepAChangelog),
            "json" => Ok(Template::Json),
            other => Err(ChangelogError::Template(other.to_string())),
        }
    }
}

impl Template {
    pub fn render(self, releases: &[Release], options: &Options) -> Result<String> {
        match self {
            Template::Compact => Ok(clean(&compact::render(releases, options))),
            Template::KeepAChangelog => Ok(clean(&keepachangelog::render(releases, options))),
            Template::Json => json::render(releases),
        }
    }
}

/// Render releases with the template called `name`.
///
/// URLs and existing files take precedence over built-in names.
pub fn render(name: &str, releases: &[Release], options: &Options) -> Result<String> {
    match custom::load(name)? {
        Some(source) => custom::render(&source, releases, options),
        None => name.parse::<Template>()?.render(releases, options),
    }
}

fn breaking(flag: bool) -> &'static str {
    if flag {
        BREAKING_PREFIX
    } else {
        ""
    }
}

/// Document heading shared by the markdown templates.
fn preamble(title: &str, options: &Options) -> String {
    let mut out = format!(
        "{}\n\nAll notable changes to this project will be documented in this file. Dates are displayed in UTC.\n\n",
        title
    );
    if !options.hide_credit {
        out.push_str(CREDIT);
        out.push_str("\n\n");
    }
    out
}

fn clean(output: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("static pattern"));
    format!("{}\n", blank_runs.replace_all(output, "\n\n").trim())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::commit::{Commit, Fix, Merge};
    use crate::domain::release::{FixEntry, Release};

    pub fn commit(subject: &str, hash: &str) -> Commit {
        Commit {
            href: Some(format!("https://github.com/user/repo/commit/{}", hash)),
            ..crate::domain::commit::fixtures::commit(hash, subject, 1, 1)
        }
    }

    /// Two tagged releases and an unreleased one, covering every section
    pub fn releases() -> Vec<Release> {
        let merge_commit = commit("Merge pull request #5 from user/feature", "ccccccccc");
        let fix_commit = commit("Fix the parser", "bbbbbbbbb");
        vec![
            Release {
                tag: None,
                version: None,
                title: "Unreleased".to_string(),
                date: "2020-06-01T12:00:00.000Z".to_string(),
                iso_date: "2020-06-01".to_string(),
                nice_date: "1 June 2020".to_string(),
                commits: vec![commit("Work in progress", "eeeeeeeee")],
                fixes: vec![],
                merges: vec![],
                summary: None,
                major: false,
                minor: false,
                href: Some("https://github.com/user/repo/compare/v1.1.0...HEAD".to_string()),
            },
            Release {
                tag: Some("v1.1.0".to_string()),
                version: Some("v1.1.0".to_string()),
                title: "v1.1.0".to_string(),
                date: "2001-01-01".to_string(),
                iso_date: "2001-01-01".to_string(),
                nice_date: "1 January 2001".to_string(),
                commits: vec![Commit {
                    breaking: true,
                    ..commit("Drop old API", "aaaaaaaaa")
                }],
                fixes: vec![FixEntry {
                    fixes: vec![Fix {
                        id: "12".to_string(),
                        href: Some("https://github.com/user/repo/issues/12".to_string()),
                        author: "Commit Author".to_string(),
                    }],
                    commit: fix_commit,
                }],
                merges: vec![Merge {
                    id: "5".to_string(),
                    message: "Add feature".to_string(),
                    href: Some("https://github.com/user/repo/pull/5".to_string()),
                    author: "Commit Author".to_string(),
                    commit: Box::new(merge_commit),
                }],
                summary: Some("Release notes".to_string()),
                major: false,
                minor: true,
                href: Some("https://github.com/user/repo/compare/v1.0.0...v1.1.0".to_string()),
            },
            Release {
                tag: Some("v1.0.0".to_string()),
                version: Some("v1.0.0".to_string()),
                title: "v1.0.0".to_string(),
                date: "2000-01-01".to_string(),
                iso_date: "2000-01-01".to_string(),
                nice_date: "1 January 2000".to_string(),
                commits: vec![commit("First commit", "ddddddddd")],
                fixes: vec![],
                merges: vec![],
                summary: None,
                major: true,
                minor: false,
                href: None,
            },
        ]
    }
}
