use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{ChangelogError, Result};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".auto-changelog.toml";

/// Config file looked up in the user config directory as a last resort.
pub const USER_CONFIG_FILE: &str = "git-changelog.toml";

/// Manifest read by `--package` when no path is given.
pub const DEFAULT_PACKAGE_FILE: &str = "package.json";

/// Key under which a package manifest may carry options.
pub const PACKAGE_OPTIONS_KEY: &str = "auto-changelog";

/// Cap on the number of plain commits shown for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Count(usize),
}

impl Limit {
    /// Resolve the cap, never going below `floor`.
    pub fn at_least(self, floor: usize) -> Option<usize> {
        match self {
            Limit::Unlimited => None,
            Limit::Count(n) => Some(n.max(floor)),
        }
    }
}

impl FromStr for Limit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "false" {
            return Ok(Limit::Unlimited);
        }
        s.parse::<usize>()
            .map(Limit::Count)
            .map_err(|_| format!("'{}' is not a count or 'false'", s))
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawLimit {
            Count(usize),
            Flag(bool),
            Text(String),
        }

        match RawLimit::deserialize(deserializer)? {
            RawLimit::Count(n) => Ok(Limit::Count(n)),
            RawLimit::Flag(false) => Ok(Limit::Unlimited),
            RawLimit::Flag(true) => Err(de::Error::custom("limit must be a count or false")),
            RawLimit::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Limit::Unlimited => serializer.serialize_bool(false),
            Limit::Count(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

/// Ordering applied to the plain commits of a release (after breaking commits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortCommits {
    #[default]
    Relevance,
    Date,
    DateDesc,
    Subject,
    SubjectDesc,
}

impl FromStr for SortCommits {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortCommits::Relevance),
            "date" => Ok(SortCommits::Date),
            "date-desc" => Ok(SortCommits::DateDesc),
            "subject" => Ok(SortCommits::Subject),
            "subject-desc" => Ok(SortCommits::SubjectDesc),
            other => Err(format!(
                "unknown sort '{}', expected relevance, date, date-desc, subject or subject-desc",
                other
            )),
        }
    }
}

/// Every option that shapes a changelog run.
///
/// Built from defaults, then a TOML config file, then command-line flags.
/// Custom templates see it serialized with camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    default,
    rename_all(serialize = "camelCase", deserialize = "kebab-case")
)]
pub struct Options {
    pub output: String,
    pub template: String,
    pub remote: String,
    pub package: Option<String>,
    pub latest_version: Option<String>,
    pub unreleased: bool,
    pub unreleased_only: bool,
    pub commit_limit: Limit,
    pub backfill_limit: Limit,
    pub commit_url: Option<String>,
    pub issue_url: Option<String>,
    pub merge_url: Option<String>,
    pub compare_url: Option<String>,
    pub issue_pattern: Option<String>,
    pub breaking_pattern: Option<String>,
    pub merge_pattern: Option<String>,
    pub ignore_commit_pattern: Option<String>,
    pub commit_pattern: Option<String>,
    pub tag_pattern: Option<String>,
    pub tag_prefix: String,
    pub tag_parser_pattern: Option<String>,
    pub tag_parser_replacement: Option<String>,
    pub starting_commit: Option<String>,
    pub starting_version: Option<String>,
    pub starting_date: Option<String>,
    pub ending_version: Option<String>,
    pub sort_commits: SortCommits,
    pub include_branch: Vec<String>,
    pub release_summary: bool,
    pub hide_empty_releases: bool,
    pub hide_credit: bool,
    #[serde(serialize_with = "pairs_as_map", deserialize_with = "ordered_pairs")]
    pub replace_text: Vec<(String, String)>,
    pub append_git_log: String,
    pub append_git_tag: String,
    pub prepend: bool,
    pub stdout: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            output: "CHANGELOG.md".to_string(),
            template: "compact".to_string(),
            remote: "origin".to_string(),
            package: None,
            latest_version: None,
            unreleased: false,
            unreleased_only: false,
            commit_limit: Limit::Count(3),
            backfill_limit: Limit::Count(3),
            commit_url: None,
            issue_url: None,
            merge_url: None,
            compare_url: None,
            issue_pattern: None,
            breaking_pattern: None,
            merge_pattern: None,
            ignore_commit_pattern: None,
            commit_pattern: None,
            tag_pattern: None,
            tag_prefix: String::new(),
            tag_parser_pattern: None,
            tag_parser_replacement: None,
            starting_commit: None,
            starting_version: None,
            starting_date: None,
            ending_version: None,
            sort_commits: SortCommits::Relevance,
            include_branch: Vec::new(),
            release_summary: false,
            hide_empty_releases: false,
            hide_credit: false,
            replace_text: Vec::new(),
            append_git_log: String::new(),
            append_git_tag: String::new(),
            prepend: false,
            stdout: false,
        }
    }
}

impl Options {
    /// Whether a synthetic entry for commits after the newest tag is wanted.
    pub fn wants_unreleased(&self) -> bool {
        self.latest_version.is_some() || self.unreleased || self.unreleased_only
    }
}

fn pairs_as_map<S: Serializer>(
    pairs: &[(String, String)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (pattern, replacement) in pairs {
        map.serialize_entry(pattern, replacement)?;
    }
    map.end()
}

/// Reads a TOML table into `(pattern, replacement)` pairs, keeping document order.
fn ordered_pairs<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of pattern = replacement strings")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut pairs = Vec::new();
            while let Some((pattern, replacement)) = map.next_entry::<String, String>()? {
                pairs.push((pattern, replacement));
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

/// Loads options from a config file and the package manifest, or returns defaults.
///
/// The config file is taken from the first of:
/// 1. Custom path provided as parameter (must exist)
/// 2. `.auto-changelog.toml` in current directory
/// 3. `git-changelog.toml` in the user config directory
///
/// Options under the `auto-changelog` key of `package.json` in the current
/// directory are layered over the config file, key by key.
pub fn load_options(config_path: Option<&str>) -> Result<Options> {
    let mut table = match read_config(config_path)? {
        Some(config_str) => toml::from_str::<toml::Table>(&config_str)?,
        None => toml::Table::new(),
    };

    if let Some(package_options) = read_package_options(DEFAULT_PACKAGE_FILE)? {
        debug!(keys = package_options.len(), "using options from {}", DEFAULT_PACKAGE_FILE);
        table.extend(package_options);
    }

    options_from_table(table)
}

fn read_config(config_path: Option<&str>) -> Result<Option<String>> {
    if let Some(path) = config_path {
        if !Path::new(path).exists() {
            return Err(ChangelogError::config(format!(
                "Config file {} does not exist",
                path
            )));
        }
        return Ok(Some(fs::read_to_string(path)?));
    }
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return Ok(Some(fs::read_to_string(DEFAULT_CONFIG_FILE)?));
    }
    match dirs::config_dir().map(|dir| dir.join(USER_CONFIG_FILE)) {
        Some(user_path) if user_path.exists() => Ok(Some(fs::read_to_string(user_path)?)),
        _ => Ok(None),
    }
}

/// Parses TOML config text on top of the defaults.
pub fn parse_options(config_str: &str) -> Result<Options> {
    options_from_table(toml::from_str(config_str)?)
}

fn options_from_table(table: toml::Table) -> Result<Options> {
    let options: Options = toml::Value::Table(table).try_into()?;
    Ok(options)
}

/// Reads the options object stored under `auto-changelog` in a JSON manifest.
///
/// Keys are accepted in camelCase (`commitLimit`) or kebab-case and come back
/// kebab-cased. Null values are dropped. A missing file or key yields `None`.
pub fn read_package_options(path: impl AsRef<Path>) -> Result<Option<toml::Table>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let Some(section) = manifest.get(PACKAGE_OPTIONS_KEY) else {
        return Ok(None);
    };
    let section = section.as_object().ok_or_else(|| {
        ChangelogError::config(format!(
            "'{}' in {} must be an object",
            PACKAGE_OPTIONS_KEY,
            path.display()
        ))
    })?;

    let mut table = toml::Table::new();
    for (key, value) in section.iter().filter(|(_, v)| !v.is_null()) {
        let value = toml::Value::try_from(value).map_err(|e| {
            ChangelogError::config(format!(
                "Option {} in {}: {}",
                key,
                path.display(),
                e
            ))
        })?;
        table.insert(kebab_case(key), value);
    }
    Ok(Some(table))
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Reads the `version` field of a JSON package manifest.
pub fn read_package_version(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        return Err(ChangelogError::config(format!("File {} does not exist", path)));
    }
    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    manifest
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ChangelogError::version(format!("No version field found in {}", path)))
}
