use chrono::NaiveDate;
use serde::Serialize;

/// A version tag (or the synthetic unreleased entry) bounding a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name, `None` for the unreleased entry
    pub tag: Option<String>,
    /// Comparable version inferred from the tag name
    pub version: Option<String>,
    pub title: String,
    pub date: String,
    pub iso_date: String,
    pub nice_date: String,
    /// Revision range selecting this release's commits
    pub diff: String,
    pub href: Option<String>,
    pub major: bool,
    pub minor: bool,
}

/// Leading `YYYY-MM-DD` of a date or timestamp
pub fn iso_date(date: &str) -> String {
    date.chars().take(10).collect()
}

/// Human readable date, e.g. `1 January 2001`
///
/// Falls back to the raw input when it does not start with a calendar date.
pub fn nice_date(date: &str) -> String {
    match NaiveDate::parse_from_str(&iso_date(date), "%Y-%m-%d") {
        Ok(day) => day.format("%-d %B %Y").to_string(),
        Err(_) => date.to_string(),
    }
}
