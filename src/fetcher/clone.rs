//! Repository cloning through the `git` binary
//!
//! A clone is a shallow `git clone` with `GIT_SSH_COMMAND` pinned to the
//! configured key. The key is scoped to the child process only; nothing in
//! this process's environment or the user's ssh agent is touched.

use super::error::{CloneError, FetchResult};
use crate::credentials::KeyHandle;
use gix_url::Scheme;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Upper bound on a single clone
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Clones submitted repositories with a fixed deploy key
///
/// Only ssh (including scp-like `user@host:path`) and https remotes are
/// cloned unless insecure transports are enabled, which also admits local
/// paths, `file://`, `git://` and `http://`.
#[derive(Debug, Clone)]
pub struct RepositoryFetcher {
    timeout: Duration,
    allow_insecure: bool,
}

impl RepositoryFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            allow_insecure: false,
        }
    }

    pub fn with_insecure_transports(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn allows_insecure_transports(&self) -> bool {
        self.allow_insecure
    }

    /// Validate `repo_url` and check its transport against this fetcher's policy
    pub fn check_url(&self, repo_url: &str) -> FetchResult<()> {
        let scheme = validate_url(repo_url)?;
        if self.allow_insecure || matches!(scheme, Scheme::Ssh | Scheme::Https) {
            Ok(())
        } else {
            Err(CloneError::InvalidUrl {
                url: repo_url.to_string(),
                reason: format!("{} transport is not enabled", scheme.as_str()),
            })
        }
    }

    /// Shallow-clone `repo_url` into `destination`
    ///
    /// Anything already at `destination` is removed first. On failure the
    /// destination may hold a partial checkout; the owning workspace is
    /// responsible for removing it.
    pub async fn fetch(&self, repo_url: &str, destination: &Path, key: &KeyHandle) -> FetchResult<()> {
        self.check_url(repo_url)?;
        prepare_destination(destination).await?;

        log::debug!(
            "Cloning {} into {} with {} key",
            describe_remote(repo_url),
            destination.display(),
            key.algorithm()
        );

        let mut cmd = git_command(key);
        cmd.arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg("--")
            .arg(repo_url)
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(CloneError::Spawn)?;
        let pid = child.id();
        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let output = match tokio::time::timeout(self.timeout, &mut wait).await {
            Ok(result) => result.map_err(CloneError::Spawn)?,
            Err(_) => {
                // git is not reaped until `wait` drops, so its group id is still ours
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                return Err(CloneError::Timeout(self.timeout));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(CloneError::Failed {
                status: format_exit_status(&output.status),
                summary: format_git_error_summary(&output.stdout, &output.stderr),
            })
        }
    }
}

impl Default for RepositoryFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CLONE_TIMEOUT)
    }
}

fn git_command(key: &KeyHandle) -> Command {
    let mut cmd = std::process::Command::new("git");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.env("GIT_SSH_COMMAND", key.ssh_command());
    cmd.env_remove("SSH_AUTH_SOCK");
    cmd.env_remove("SSH_ASKPASS");
    cmd.args([
        "-c",
        "core.hooksPath=/dev/null",
        "-c",
        "credential.helper=",
        "-c",
        "protocol.ext.allow=never",
    ]);

    // A group of its own lets a timeout reach the ssh child as well
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    Command::from(cmd)
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal and touches no memory
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        log::debug!(
            "Could not signal process group {}: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

async fn prepare_destination(destination: &Path) -> FetchResult<()> {
    let io_err = |source| CloneError::Io {
        path: destination.to_path_buf(),
        source,
    };

    match tokio::fs::symlink_metadata(destination).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(destination).await.map_err(io_err)?,
        Ok(_) => tokio::fs::remove_file(destination).await.map_err(io_err)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    Ok(())
}

/// Check that `repo_url` is something git may safely be pointed at
///
/// Accepts https, http, ssh, scp-like, git and local file locations and
/// returns the scheme. Remote helper syntax (`transport::address`) and hosts
/// or users that git would read as command-line options are refused.
pub fn validate_url(repo_url: &str) -> FetchResult<Scheme> {
    let invalid = |reason: &str| CloneError::InvalidUrl {
        url: repo_url.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = repo_url.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("URL must not start with '-'"));
    }
    if is_remote_helper_syntax(trimmed) {
        return Err(invalid("remote helper transports are not allowed"));
    }

    let url = gix_url::parse(trimmed.as_bytes().into()).map_err(|e| invalid(&e.to_string()))?;

    if let Scheme::Ext(name) = &url.scheme {
        return Err(invalid(&format!("unsupported scheme '{}'", name)));
    }
    if url.host().is_some_and(|host| host.starts_with('-')) {
        return Err(invalid("host must not start with '-'"));
    }
    if url.user().is_some_and(|user| user.starts_with('-')) {
        return Err(invalid("user must not start with '-'"));
    }

    Ok(url.scheme)
}

// `<transport>::<address>` hands the address to git-remote-<transport>
fn is_remote_helper_syntax(url: &str) -> bool {
    match url.find("::") {
        Some(pos) => {
            let transport = &url[..pos];
            !transport.is_empty()
                && transport
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '_'))
        }
        None => false,
    }
}

/// A credential-free description of the remote for logs
pub fn describe_remote(repo_url: &str) -> String {
    match gix_url::parse(repo_url.trim().as_bytes().into()) {
        Ok(url) => match (&url.scheme, url.host()) {
            (Scheme::File, _) => "local repository".to_string(),
            (scheme, Some(host)) => format!("{}://{}", scheme.as_str(), host),
            (scheme, None) => format!("{} remote", scheme.as_str()),
        },
        Err(_) => "unparseable remote".to_string(),
    }
}

fn format_exit_status(status: &ExitStatus) -> String {
    status
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| status.to_string())
}

fn format_git_error_summary(stdout: &[u8], stderr: &[u8]) -> String {
    let messages: Vec<String> = [stderr, stdout]
        .into_iter()
        .filter_map(summarize_output)
        .collect();

    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join(" | "))
    }
}

fn summarize_output(output: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(output);
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
