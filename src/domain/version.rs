//! Loose semantic-version helpers for tag names and commit subjects
//!
//! Tags are usually written as `v1.2.3`, which strict semver rejects, so every
//! helper here tolerates a leading `v` or `=` the way release tooling does.

use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Component that differs first between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    PreMajor,
    Minor,
    PreMinor,
    Patch,
    PrePatch,
    PreRelease,
}

/// Parse a version, ignoring surrounding whitespace and a leading `v` or `=`.
pub fn parse_loose(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let clean = trimmed
        .strip_prefix('=')
        .unwrap_or(trimmed)
        .trim_start_matches(['v', 'V']);
    Version::parse(clean).ok()
}

/// Whether the string is a valid (loose) semantic version.
pub fn is_valid(input: &str) -> bool {
    parse_loose(input).is_some()
}

fn single_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?\d+$").expect("static pattern"))
}

fn major_minor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?\d+\.\d+$").expect("static pattern"))
}

/// Complete a partial version: `v1` becomes `v1.0.0`, `v1.0` becomes `v1.0.0`.
pub fn infer_semver(tag: &str) -> String {
    if single_number().is_match(tag) {
        return format!("{}.0.0", tag);
    }
    if major_minor().is_match(tag) {
        return format!("{}.0", tag);
    }
    tag.to_string()
}

/// Descending comparison: semver when both sides parse, else lexicographic.
pub fn rcompare(a: &str, b: &str) -> Ordering {
    match (parse_loose(a), parse_loose(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        _ => b.cmp(a),
    }
}

/// The most significant component that changed between `a` and `b`.
///
/// Returns `None` when both parse to the same version or either is invalid.
pub fn diff(a: &str, b: &str) -> Option<VersionBump> {
    let (va, vb) = (parse_loose(a)?, parse_loose(b)?);
    if va == vb {
        return None;
    }
    let prerelease = !va.pre.is_empty() || !vb.pre.is_empty();
    let bump = match (va.major != vb.major, va.minor != vb.minor, va.patch != vb.patch) {
        (true, _, _) if prerelease => VersionBump::PreMajor,
        (true, _, _) => VersionBump::Major,
        (_, true, _) if prerelease => VersionBump::PreMinor,
        (_, true, _) => VersionBump::Minor,
        (_, _, true) if prerelease => VersionBump::PrePatch,
        (_, _, true) => VersionBump::Patch,
        _ => VersionBump::PreRelease,
    };
    Some(bump)
}
