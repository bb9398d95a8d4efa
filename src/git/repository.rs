use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use git2::Repository as Git2Repo;
use semver::Version;
use tracing::{debug, trace};

use crate::commits;
use crate::error::{ChangelogError, Result};
use crate::tags;

const READ_CHUNK: usize = 8 * 1024;

/// Runs the `git` binary inside a discovered repository
///
/// Logs and tag listings go through the command line so that user supplied
/// `--append-git-log`/`--append-git-tag` flags behave exactly like git's own.
/// Remote lookup goes through libgit2.
#[derive(Debug, Clone)]
pub struct SystemGit {
    work_tree: PathBuf,
}

impl SystemGit {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref())?;
        let work_tree = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        debug!(path = %work_tree.display(), "opened repository");
        Ok(SystemGit { work_tree })
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.work_tree);
        cmd
    }

    /// Run git and return stdout.
    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = self.git_cmd();
        cmd.args(args);
        capture(&mut cmd)
    }
}

/// Run a command and return its stdout, reading it in chunks as it arrives.
///
/// Stderr is drained on its own thread so a chatty command cannot fill the
/// pipe and stall while stdout is still being read.
fn capture(cmd: &mut Command) -> Result<String> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    debug!(command = ?cmd, "running git");

    let mut child = cmd
        .spawn()
        .map_err(|e| ChangelogError::git(format!("Failed to execute git: {}", e)))?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer).map(|_| buffer)
        })
    });

    let mut stdout = Vec::new();
    if let Some(mut pipe) = child.stdout.take() {
        let mut buffer = [0u8; READ_CHUNK];
        loop {
            let read = pipe.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            stdout.extend_from_slice(&buffer[..read]);
            trace!(bytes = stdout.len(), "received git output");
        }
    }

    let status = child.wait()?;
    let stderr = match stderr_reader {
        Some(handle) => handle
            .join()
            .map_err(|_| ChangelogError::git("stderr reader panicked"))??,
        None => Vec::new(),
    };

    if !status.success() {
        return Err(ChangelogError::git(format!(
            "{:?} exited with {}: {}",
            cmd,
            status,
            String::from_utf8_lossy(&stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

impl super::Repository for SystemGit {
    fn git_version(&self) -> Result<Option<Version>> {
        let output = self.run(["--version"])?;
        Ok(commits::git_version(&output))
    }

    fn list_tags(&self, branch: Option<&str>, extra_args: &str) -> Result<String> {
        self.run(tags::list_args(branch, extra_args))
    }

    fn log(&self, range: &str, format: &str, extra_args: &str) -> Result<String> {
        let mut args = vec![
            "log".to_string(),
            range.to_string(),
            "--shortstat".to_string(),
            format!("--pretty=format:{}", format),
        ];
        args.extend(extra_args.split_whitespace().map(str::to_string));
        self.run(args)
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let repo = Git2Repo::open(&self.work_tree)?;
        let url = match repo.find_remote(name) {
            Ok(remote) => remote.url().map(str::to_string),
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) if e.class() == git2::ErrorClass::Config => None,
            Err(e) => return Err(e.into()),
        };
        Ok(url)
    }
}
