use super::{breaking, preamble};
use crate::config::Options;
use crate::domain::release::Release;

/// Layout following keepachangelog.com: dated headings and one section per kind.
pub(super) fn render(releases: &[Release], options: &Options) -> String {
    let mut out = preamble("# Changelog", options);
    for release in releases {
        let date = match release.tag {
            Some(_) => format!(" - {}", release.iso_date),
            None => String::new(),
        };
        match &release.href {
            Some(href) => out.push_str(&format!("## [{}]({}){}\n\n", release.title, href, date)),
            None => out.push_str(&format!("## {}{}\n\n", release.title, date)),
        }

        if let Some(summary) = &release.summary {
            out.push_str(summary);
            out.push_str("\n\n");
        }

        if !release.merges.is_empty() {
            out.push_str("### Merged\n\n");
            for merge in &release.merges {
                out.push_str(&format!("- {}{}", breaking(merge.commit.breaking), merge.message));
                if let Some(href) = &merge.href {
                    out.push_str(&format!(" [`#{}`]({})", merge.id, href));
                }
                out.push('\n');
            }
            out.push('\n');
        }

        if !release.fixes.is_empty() {
            out.push_str("### Fixed\n\n");
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
            out.push('\n');
        }

        if !release.commits.is_empty() {
            out.push_str("### Commits\n\n");
            for commit in &release.commits {
                out.push_str(&format!("- {}{}", breaking(commit.breaking), commit.subject));
                if let Some(href) = &commit.href {
                    out.push_str(&format!(" [`{}`]({})", commit.short_hash, href));
                }
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}
