use super::{breaking, preamble};
use crate::config::Options;
use crate::domain::release::Release;

/// Slim layout: one heading per release, then a flat list of entries.
pub(super) fn render(releases: &[Release], options: &Options) -> String {
    let mut out = preamble("### Changelog", options);
    for release in releases {
        out.push_str(&heading(release));
        out.push_str("\n\n");
        if release.tag.is_some() {
            out.push_str(&format!("> {}\n\n", release.nice_date));
        }
        if let Some(summary) = &release.summary {
            out.push_str(summary);
            out.push_str("\n\n");
        }
        for merge in &release.merges {
            out.push_str(&format!("- {}{}", breaking(merge.commit.breaking), merge.message));
            if let Some(href) = &merge.href {
                out.push_str(&format!(" [`#{}`]({})", merge.id, href));
            }
            out.push('\n');
        }
        for entry in &release.fixes {
            out.push_str(&format!(
                "- {}{}",
                breaking(entry.commit.breaking),
                entry.commit.subject
            ));
            for fix in &entry.fixes {
                if let Some(href) = &fix.href {
                    out.push_str(&format!(" [`#{}`]({})", fix.id, href));
                }
            }
            out.push('\n');
        }
        for commit in &release.commits {
            out.push_str(&format!("- {}{}", breaking(commit.breaking), commit.subject));
            if let Some(href) = &commit.href {
                out.push_str(&format!(" [`{}`]({})", commit.short_hash, href));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Major releases get a bigger heading.
fn heading(release: &Release) -> String {
    match &release.href {
        Some(href) if release.major => format!("### [{}]({})", release.title, href),
        Some(href) => format!("#### [{}]({})", release.title, href),
        None => format!("#### {}", release.title),
    }
}
