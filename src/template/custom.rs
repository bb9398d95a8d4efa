//! User supplied Handlebars templates
//!
//! A template name that is an http(s) URL is fetched, a name that is an
//! existing file is read. Both are rendered with the release list and the
//! run options as `{ releases, options }`, without HTML escaping.

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, Renderable, StringOutput,
};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::config::Options;
use crate::domain::release::Release;
use crate::error::{ChangelogError, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct TemplateData<'a> {
    releases: &'a [Release],
    options: &'a Options,
}

/// Source text of a custom template, or `None` when `name` is neither a URL
/// nor an existing file.
pub(super) fn load(name: &str) -> Result<Option<String>> {
    if is_url(name) {
        return fetch(name).map(Some);
    }
    let path = Path::new(name);
    if path.is_file() {
        debug!(path = %path.display(), "reading template file");
        return Ok(Some(fs::read_to_string(path)?));
    }
    Ok(None)
}

fn is_url(name: &str) -> bool {
    url::Url::parse(name)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn fetch(url: &str) -> Result<String> {
    debug!(url, "fetching template");
    let fetch_error = |source| ChangelogError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("git-changelog/{}", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(fetch_error)
}

/// Render `source` against the releases and options.
pub(super) fn render(source: &str, releases: &[Release], options: &Options) -> Result<String> {
    let registry = registry();
    let data = TemplateData { releases, options };
    let output = registry
        .render_template(source, &data)
        .map_err(|e| ChangelogError::Render(e.to_string()))?;
    Ok(super::clean(&strip_indentation(&output)))
}

fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_helper("json", Box::new(json_helper));
    registry.register_helper("commit-list", Box::new(commit_list_helper));
    registry.register_helper("matches", Box::new(matches_helper));
    registry
}

/// Drop leading spaces from every line so templates can be indented freely.
fn strip_indentation(output: &str) -> String {
    static INDENT: OnceLock<Regex> = OnceLock::new();
    let indent = INDENT.get_or_init(|| Regex::new(r"(?m)^ +").expect("static pattern"));
    indent.replace_all(output, "").into_owned()
}

fn render_error(message: impl Into<String>) -> RenderError {
    RenderErrorReason::Other(message.into()).into()
}

fn helper_regex(pattern: &str, flags: &str) -> std::result::Result<Regex, RenderError> {
    // g, u and y have no meaning for a single test
    let inline: String = flags.chars().filter(|c| "imsx".contains(*c)).collect();
    let pattern = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", inline, pattern)
    };
    Regex::new(&pattern).map_err(|e| render_error(format!("invalid pattern: {}", e)))
}

fn string_hash<'a>(h: &'a Helper, key: &str) -> Option<&'a str> {
    h.hash_get(key).and_then(|v| v.value().as_str())
}

/// `{{json value}}`: pretty JSON of any value.
fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("json", 0))?;
    let text = serde_json::to_string_pretty(value.value())
        .map_err(|e| render_error(e.to_string()))?;
    out.write(&text)?;
    Ok(())
}

/// `{{#commit-list list heading=… exclude=… message=… subject=…}}…{{/commit-list}}`
///
/// Renders the block once per kept item, with the item as context. Items may
/// be commits or anything carrying a `commit` (merges, fixes). `exclude` and
/// `message` are multi-line patterns over the commit message, `subject` a
/// pattern over the subject. Nothing is written when no item is kept.
fn commit_list_helper<'reg, 'rc>(
    h: &Helper<'rc>,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let Some(items) = h.param(0).and_then(|p| p.value().as_array()) else {
        return Ok(());
    };
    let Some(template) = h.template() else {
        return Ok(());
    };

    let exclude = string_hash(h, "exclude")
        .map(|p| helper_regex(p, "m"))
        .transpose()?;
    let message = string_hash(h, "message")
        .map(|p| helper_regex(p, "m"))
        .transpose()?;
    let subject = string_hash(h, "subject")
        .map(|p| helper_regex(p, ""))
        .transpose()?;

    let mut list = String::new();
    for item in items {
        let commit = item.get("commit").unwrap_or(item);
        let field = |name: &str| commit.get(name).and_then(Value::as_str).unwrap_or("");

        if exclude.as_ref().is_some_and(|re| re.is_match(field("message"))) {
            continue;
        }
        let keep = match (&message, &subject) {
            (Some(re), _) => re.is_match(field("message")),
            (None, Some(re)) => re.is_match(field("subject")),
            (None, None) => true,
        };
        if !keep {
            continue;
        }

        let mut block = BlockContext::new();
        block.set_base_value(item.clone());
        rc.push_block(block);
        let mut buffer = StringOutput::new();
        let rendered = template.render(r, ctx, rc, &mut buffer);
        rc.pop_block();
        rendered?;
        list.push_str(
            &buffer
                .into_string()
                .map_err(|e| render_error(e.to_string()))?,
        );
    }

    if list.is_empty() {
        return Ok(());
    }
    if let Some(heading) = string_hash(h, "heading") {
        out.write(heading)?;
        out.write("\n\n")?;
    }
    out.write(&list)?;
    Ok(())
}

/// `{{#matches value pattern flags="i"}}…{{else}}…{{/matches}}`
fn matches_helper<'reg, 'rc>(
    h: &Helper<'rc>,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("matches", 0))?;
    let pattern = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("matches", 1))?;
    let re = helper_regex(pattern, string_hash(h, "flags").unwrap_or(""))?;

    let text = match value.value() {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let branch = if re.is_match(&text) {
        h.template()
    } else {
        h.inverse()
    };
    match branch {
        Some(t) => t.render(r, ctx, rc, out),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{fixtures, render as render_named};
    use super::*;
    use tempfile::TempDir;

    fn render_source(source: &str) -> String {
        render(source, &fixtures::releases(), &Options::default()).unwrap()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/changelog.hbs"));
        assert!(is_url("http://localhost:8080/t.hbs"));
        assert!(!is_url("ftp://example.com/t.hbs"));
        assert!(!is_url("templates/changelog.hbs"));
        assert!(!is_url("compact"));
    }

    #[test]
    fn test_template_file_is_rendered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog.hbs");
        fs::write(
            &path,
            "# History\n\n{{#each releases}}  - {{title}} ({{isoDate}})\n{{/each}}",
        )
        .unwrap();

        let output = render_named(
            path.to_str().unwrap(),
            &fixtures::releases(),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(
            output,
            "# History\n\n- Unreleased (2020-06-01)\n- v1.1.0 (2001-01-01)\n- v1.0.0 (2000-01-01)\n"
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.hbs");
        let err = render_named(
            path.to_str().unwrap(),
            &fixtures::releases(),
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ChangelogError::Template(_)));
    }

    #[test]
    fn test_output_is_not_escaped() {
        let releases = vec![Release {
            title: "<b>&</b>".to_string(),
            ..fixtures::releases().remove(2)
        }];
        let output = render("{{#each releases}}{{title}}{{/each}}", &releases, &Options::default())
            .unwrap();
        assert_eq!(output, "<b>&</b>\n");
    }

    #[test]
    fn test_options_are_available() {
        let output = render_source("{{#if options.hideCredit}}hidden{{else}}credit {{options.commitLimit}}{{/if}}");
        assert_eq!(output, "credit 3\n");
    }

    #[test]
    fn test_json_helper() {
        let output = render_source("{{#each releases}}{{#if fixes}}{{json fixes}}{{/if}}{{/each}}");
        let value: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value[0]["fixes"][0]["id"], "12");
    }

    #[test]
    fn test_commit_list_heading_and_filters() {
        let source = "{{#each releases}}{{#if tag}}\
                      {{#commit-list merges heading=\"### Merged\"}}- {{message}}\n{{/commit-list}}\
                      {{#commit-list commits heading=\"### Breaking\" message=\"^Drop\"}}- {{subject}}\n{{/commit-list}}\
                      {{#commit-list commits heading=\"### Other\" exclude=\"^Drop\"}}- {{subject}}\n{{/commit-list}}\
                      {{/if}}{{/each}}";
        let output = render_source(source);
        assert_eq!(
            output,
            "### Merged\n\n- Add feature\n### Breaking\n\n- Drop old API\n### Other\n\n- First commit\n"
        );
    }

    #[test]
    fn test_commit_list_subject_filter_reads_nested_commit() {
        let source = "{{#each releases}}\
                      {{#commit-list fixes subject=\"^Fix\"}}* {{commit.subject}}\n{{/commit-list}}\
                      {{#commit-list fixes subject=\"^Nothing\" heading=\"unused\"}}x{{/commit-list}}\
                      {{/each}}";
        assert_eq!(render_source(source), "* Fix the parser\n");
    }

    #[test]
    fn test_matches_helper() {
        let source = "{{#each releases}}\
                      {{#matches title \"^V1\" flags=\"gi\"}}[{{title}}]{{else}}({{title}}){{/matches}}\
                      {{/each}}";
        assert_eq!(render_source(source), "(Unreleased)[v1.1.0][v1.0.0]\n");
    }

    #[test]
    fn test_invalid_template_is_reported() {
        let err = render("{{#each releases}}", &[], &Options::default()).unwrap_err();
        assert!(err.to_string().starts_with("Template error"), "got {}", err);
    }
}
