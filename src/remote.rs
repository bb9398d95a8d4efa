//! Link building for the hosting provider behind a git remote
//!
//! A remote URL is parsed once into a [`RemoteDescriptor`], classified into a
//! [`Host`] shape, and then asked for commit, issue, merge and compare links.
//! With no remote every link is `None`, unless a URL override is configured.

use url::Url;

use crate::config::Options;

/// Normalized pieces of a git remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// `http` or `https` (ssh remotes map to `https`)
    pub protocol: String,
    pub hostname: String,
    pub owner: String,
    /// `owner/name` without a `.git` suffix
    pub repo: String,
    /// Path segments after the repository name, kept verbatim
    pub branch: Option<String>,
    /// Whole path without a trailing `.git`
    pub path: String,
}

impl RemoteDescriptor {
    /// Parse `https://host/owner/repo`, `ssh://git@host/owner/repo.git`
    /// or scp-like `git@host:owner/repo.git`.
    pub fn parse(remote_url: &str) -> Option<Self> {
        let trimmed = remote_url.trim();
        if trimmed.is_empty() {
            return None;
        }

        let url = if trimmed.contains("://") {
            Url::parse(trimmed).ok()?
        } else {
            let (host, path) = trimmed.split_once(':')?;
            Url::parse(&format!("ssh://{}/{}", host, path.trim_start_matches('/'))).ok()?
        };

        let hostname = url.host_str()?.to_string();
        let protocol = if url.scheme() == "http" { "http" } else { "https" }.to_string();
        let segments: Vec<&str> = url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.len() < 2 {
            return None;
        }

        let owner = segments[0].to_string();
        let name = segments[1].trim_end_matches(".git");
        let branch = (segments.len() > 2).then(|| segments[2..].join("/"));
        let path = segments.join("/").trim_end_matches(".git").to_string();

        Some(RemoteDescriptor {
            protocol,
            hostname,
            repo: format!("{}/{}", owner, name),
            owner,
            branch,
            path,
        })
    }

    fn base(&self) -> String {
        format!("{}://{}", self.protocol, self.hostname)
    }
}

/// Hosting provider shape, chosen once from the remote hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    GitHub { url: String },
    GitLab { url: String },
    GitLabSubgroup { url: String },
    BitBucket { url: String },
    Azure { url: String, project: String },
    VisualStudio { url: String, project: String },
    Generic { url: String },
}

impl Host {
    /// Classify a parsed remote by substring match on its hostname.
    pub fn detect(remote: &RemoteDescriptor) -> Self {
        let hostname = remote.hostname.as_str();
        let base = remote.base();

        if hostname.contains("bitbucket") {
            return Host::BitBucket {
                url: format!("{}/{}", base, remote.repo),
            };
        }

        if hostname.contains("gitlab") {
            return match remote.branch.as_deref() {
                Some(subgroup) if subgroup.ends_with(".git") => Host::GitLabSubgroup {
                    url: format!(
                        "{}/{}/{}",
                        base,
                        remote.repo,
                        subgroup.trim_end_matches(".git")
                    ),
                },
                _ => Host::GitLab {
                    url: format!("{}/{}", base, remote.repo),
                },
            };
        }

        if hostname.contains("dev.azure") {
            return Host::Azure {
                url: format!("{}/{}", base, remote.path),
                project: format!("{}/{}", base, remote.repo),
            };
        }

        if hostname.contains("visualstudio") {
            let url = match remote.branch.as_deref() {
                Some(branch) => format!("{}/{}/{}", base, remote.repo, branch),
                None => format!("{}/{}", base, remote.repo),
            };
            return Host::VisualStudio {
                url,
                project: format!("{}/{}", base, remote.owner),
            };
        }

        let url = format!("{}/{}", base, remote.repo);
        if hostname.contains("github") {
            Host::GitHub { url }
        } else {
            Host::Generic { url }
        }
    }

    /// Base URL of the repository in the hosting UI
    pub fn url(&self) -> &str {
        match self {
            Host::GitHub { url }
            | Host::GitLab { url }
            | Host::GitLabSubgroup { url }
            | Host::BitBucket { url }
            | Host::Azure { url, .. }
            | Host::VisualStudio { url, .. }
            | Host::Generic { url } => url,
        }
    }

    fn commit_link(&self, id: &str) -> String {
        match self {
            Host::BitBucket { url } => format!("{}/commits/{}", url, id),
            other => format!("{}/commit/{}", other.url(), id),
        }
    }

    fn issue_link(&self, id: &str) -> String {
        match self {
            Host::Azure { project, .. } | Host::VisualStudio { project, .. } => {
                format!("{}/_workitems/edit/{}", project, id)
            }
            other => format!("{}/issues/{}", other.url(), id),
        }
    }

    fn merge_link(&self, id: &str) -> String {
        match self {
            Host::BitBucket { url } => format!("{}/pull-requests/{}", url, id),
            Host::GitLab { url } | Host::GitLabSubgroup { url } => {
                format!("{}/merge_requests/{}", url, id)
            }
            Host::Azure { url, .. } | Host::VisualStudio { url, .. } => {
                format!("{}/pullrequest/{}", url, id)
            }
            Host::GitHub { url } | Host::Generic { url } => format!("{}/pull/{}", url, id),
        }
    }

    fn compare_link(&self, from: &str, to: &str) -> String {
        match self {
            Host::BitBucket { url } => format!("{}/compare/{}..{}", url, to, from),
            Host::Azure { url, .. } | Host::VisualStudio { url, .. } => format!(
                "{}/branches?baseVersion=GT{}&targetVersion=GT{}&_a=commits",
                url, to, from
            ),
            other => format!("{}/compare/{}...{}", other.url(), from, to),
        }
    }
}

/// User-supplied URL templates that win over the detected host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOverrides {
    pub commit_url: Option<String>,
    pub issue_url: Option<String>,
    pub merge_url: Option<String>,
    pub compare_url: Option<String>,
}

impl LinkOverrides {
    pub fn from_options(options: &Options) -> Self {
        LinkOverrides {
            commit_url: options.commit_url.clone(),
            issue_url: options.issue_url.clone(),
            merge_url: options.merge_url.clone(),
            compare_url: options.compare_url.clone(),
        }
    }

    /// Every link kind has an override, so a missing remote changes nothing
    pub fn is_complete(&self) -> bool {
        self.commit_url.is_some()
            && self.issue_url.is_some()
            && self.merge_url.is_some()
            && self.compare_url.is_some()
    }
}

/// Link builder for commits, issues, merges and release comparisons
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remote {
    host: Option<Host>,
    overrides: LinkOverrides,
}

impl Remote {
    pub fn new(host: Option<Host>, overrides: LinkOverrides) -> Self {
        Remote { host, overrides }
    }

    /// Build from the raw remote URL (if any) and the link options.
    pub fn resolve(remote_url: Option<&str>, options: &Options) -> Self {
        let host = remote_url
            .and_then(RemoteDescriptor::parse)
            .map(|descriptor| Host::detect(&descriptor));
        Remote::new(host, LinkOverrides::from_options(options))
    }

    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub fn overrides(&self) -> &LinkOverrides {
        &self.overrides
    }

    pub fn commit_link(&self, id: &str) -> Option<String> {
        match &self.overrides.commit_url {
            Some(template) => Some(template.replacen("{id}", id, 1)),
            None => self.host.as_ref().map(|host| host.commit_link(id)),
        }
    }

    pub fn issue_link(&self, id: &str) -> Option<String> {
        match &self.overrides.issue_url {
            Some(template) => Some(template.replacen("{id}", id, 1)),
            None => self.host.as_ref().map(|host| host.issue_link(id)),
        }
    }

    pub fn merge_link(&self, id: &str) -> Option<String> {
        match &self.overrides.merge_url {
            Some(template) => Some(template.replacen("{id}", id, 1)),
            None => self.host.as_ref().map(|host| host.merge_link(id)),
        }
    }

    pub fn compare_link(&self, from: &str, to: &str) -> Option<String> {
        match &self.overrides.compare_url {
            Some(template) => Some(
                template
                    .replacen("{from}", from, 1)
                    .replacen("{to}", to, 1),
            ),
            None => self.host.as_ref().map(|host| host.compare_link(from, to)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_for(remote_url: &str) -> Host {
        Host::detect(&RemoteDescriptor::parse(remote_url).unwrap())
    }

    fn remote_for(remote_url: &str) -> Remote {
        Remote::resolve(Some(remote_url), &Options::default())
    }

    #[test]
    fn test_parse_github_variants() {
        for remote_url in [
            "https://github.com/user/repo",
            "https://github.com:8080/user/repo",
            "git@github.com:user/repo.git",
            "ssh://git@github.com/user/repo.git",
        ] {
            assert_eq!(
                host_for(remote_url),
                Host::GitHub {
                    url: "https://github.com/user/repo".to_string()
                },
                "remote {}",
                remote_url
            );
        }
    }

    #[test]
    fn test_parse_keeps_http() {
        let descriptor = RemoteDescriptor::parse("http://git.example.com/team/tool").unwrap();
        assert_eq!(descriptor.protocol, "http");
        assert_eq!(
            Host::detect(&descriptor),
            Host::Generic {
                url: "http://git.example.com/team/tool".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RemoteDescriptor::parse("").is_none());
        assert!(RemoteDescriptor::parse("not a remote").is_none());
        assert!(RemoteDescriptor::parse("https://github.com/only-owner").is_none());
    }

    #[test]
    fn test_gitlab() {
        assert_eq!(
            host_for("git@gitlab.com:user/repo.git"),
            Host::GitLab {
                url: "https://gitlab.com/user/repo".to_string()
            }
        );
    }

    #[test]
    fn test_gitlab_subgroup() {
        for remote_url in [
            "https://gitlab.com/user/repo/subgroup.git",
            "git@gitlab.com:user/repo/subgroup.git",
        ] {
            assert_eq!(
                host_for(remote_url),
                Host::GitLabSubgroup {
                    url: "https://gitlab.com/user/repo/subgroup".to_string()
                }
            );
        }
    }

    #[test]
    fn test_bitbucket_links() {
        let remote = remote_for("git@bitbucket.org:user/repo.git");
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://bitbucket.org/user/repo/commits/abc")
        );
        assert_eq!(
            remote.merge_link("7").as_deref(),
            Some("https://bitbucket.org/user/repo/pull-requests/7")
        );
        assert_eq!(
            remote.compare_link("v1.0.0", "v1.1.0").as_deref(),
            Some("https://bitbucket.org/user/repo/compare/v1.1.0..v1.0.0")
        );
    }

    #[test]
    fn test_github_links() {
        let remote = remote_for("https://github.com/user/repo");
        assert_eq!(
            remote.issue_link("12").as_deref(),
            Some("https://github.com/user/repo/issues/12")
        );
        assert_eq!(
            remote.merge_link("3").as_deref(),
            Some("https://github.com/user/repo/pull/3")
        );
        assert_eq!(
            remote.compare_link("v1.0.0", "HEAD").as_deref(),
            Some("https://github.com/user/repo/compare/v1.0.0...HEAD")
        );
    }

    #[test]
    fn test_azure_links() {
        let remote = remote_for("https://dev.azure.com/organization/project/_git/repo");
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://dev.azure.com/organization/project/_git/repo/commit/abc")
        );
        assert_eq!(
            remote.issue_link("123").as_deref(),
            Some("https://dev.azure.com/organization/project/_workitems/edit/123")
        );
        assert_eq!(
            remote.merge_link("5").as_deref(),
            Some("https://dev.azure.com/organization/project/_git/repo/pullrequest/5")
        );
    }

    #[test]
    fn test_visual_studio_links() {
        let remote = remote_for("https://organization.visualstudio.com/project/_git/repo");
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://organization.visualstudio.com/project/_git/repo/commit/abc")
        );
        assert_eq!(
            remote.issue_link("123").as_deref(),
            Some("https://organization.visualstudio.com/project/_workitems/edit/123")
        );
        assert_eq!(
            remote.compare_link("v1", "v2").as_deref(),
            Some("https://organization.visualstudio.com/project/_git/repo/branches?baseVersion=GTv2&targetVersion=GTv1&_a=commits")
        );
    }

    #[test]
    fn test_no_remote_returns_none() {
        let remote = Remote::resolve(None, &Options::default());
        assert!(remote.host().is_none());
        assert_eq!(remote.commit_link("abc"), None);
        assert_eq!(remote.issue_link("1"), None);
        assert_eq!(remote.merge_link("1"), None);
        assert_eq!(remote.compare_link("a", "b"), None);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let options = Options {
            issue_url: Some("https://issues.example.com/browse/{id}".to_string()),
            compare_url: Some("https://diff.example.com/{from}/{to}".to_string()),
            ..Options::default()
        };
        let remote = Remote::resolve(Some("https://github.com/user/repo"), &options);
        assert_eq!(
            remote.issue_link("PROJ-1").as_deref(),
            Some("https://issues.example.com/browse/PROJ-1")
        );
        assert_eq!(
            remote.compare_link("v1", "v2").as_deref(),
            Some("https://diff.example.com/v1/v2")
        );
        // Not overridden, still from the host
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://github.com/user/repo/commit/abc")
        );
    }

    #[test]
    fn test_overrides_work_without_remote() {
        let options = Options {
            commit_url: Some("https://code.example.com/c/{id}".to_string()),
            ..Options::default()
        };
        let remote = Remote::resolve(None, &options);
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://code.example.com/c/abc")
        );
        assert_eq!(remote.merge_link("1"), None);
        assert!(!remote.overrides().is_complete());
    }

    #[test]
    fn test_overrides_fill_first_placeholder_only() {
        let options = Options {
            commit_url: Some("https://code.example.com/{id}?ref={id}".to_string()),
            compare_url: Some("https://diff.example.com/{from}/{to}/{to}".to_string()),
            ..Options::default()
        };
        let remote = Remote::resolve(None, &options);
        assert_eq!(
            remote.commit_link("abc").as_deref(),
            Some("https://code.example.com/abc?ref={id}")
        );
        assert_eq!(
            remote.compare_link("v1", "v2").as_deref(),
            Some("https://diff.example.com/v1/v2/{to}")
        );
    }
}
