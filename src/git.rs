use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

use crate::config::Config;

/// Hard cap on any single git invocation. A hung credential helper or a
/// dead network mount must not wedge the whole dashboard.
const GIT_TIMEOUT: Duration = Duration::from_secs(10);
const TIMEOUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct CmdOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    fn failure(stderr: impl Into<String>) -> Self {
        CmdOutput {
            code: 1,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// Status of one repository, rebuilt wholesale on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoStatus {
    pub name: String,
    pub path: PathBuf,
    pub state: RepoState,
    pub updated_at: SystemTime,
}

/// Either we could read the repository or we could not; a broken repository
/// carries a reason instead of a pile of meaningless zero counts.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoState {
    Available(SyncInfo),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncInfo {
    pub branch: String,
    pub tracking: Tracking,
    pub dirty: usize,
    pub untracked: usize,
    pub stashes: usize,
    pub fetch_error: Option<String>,
}

/// Relationship to the upstream branch. `Unknown` means the upstream exists
/// but the ahead/behind query failed, which is not the same as "in sync".
#[derive(Debug, Clone, PartialEq)]
pub enum Tracking {
    None,
    Known {
        upstream: String,
        ahead: usize,
        behind: usize,
    },
    Unknown {
        upstream: String,
        error: String,
    },
}

/// Severity-ordered classification used for the list glyph. Dirty outranks
/// divergence: uncommitted local changes are the more urgent risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Failed,
    Modified,
    NoUpstream,
    Diverged,
    Behind,
    Ahead,
    Clean,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Failed => "✗",
            Glyph::Modified => "●",
            Glyph::NoUpstream => "?",
            Glyph::Diverged => "⇅",
            Glyph::Behind => "↓",
            Glyph::Ahead => "↑",
            Glyph::Clean => "✓",
        }
    }
}

impl RepoStatus {
    /// True when the operator should look at this repository: local commits
    /// to push, remote commits to pull, or uncommitted changes. Repositories
    /// we failed to read (or whose divergence is unknown) also qualify.
    pub fn needs_attention(&self) -> bool {
        match &self.state {
            RepoState::Unavailable { .. } => true,
            RepoState::Available(info) => {
                if info.dirty > 0 {
                    return true;
                }
                match &info.tracking {
                    Tracking::Known { ahead, behind, .. } => *ahead > 0 || *behind > 0,
                    Tracking::Unknown { .. } => true,
                    Tracking::None => false,
                }
            }
        }
    }

    pub fn glyph(&self) -> Glyph {
        let info = match &self.state {
            RepoState::Unavailable { .. } => return Glyph::Failed,
            RepoState::Available(info) => info,
        };
        if matches!(info.tracking, Tracking::Unknown { .. }) {
            return Glyph::Failed;
        }
        if info.dirty > 0 {
            return Glyph::Modified;
        }
        match &info.tracking {
            Tracking::None => Glyph::NoUpstream,
            Tracking::Known { ahead, behind, .. } => match (*ahead > 0, *behind > 0) {
                (true, true) => Glyph::Diverged,
                (false, true) => Glyph::Behind,
                (true, false) => Glyph::Ahead,
                (false, false) => Glyph::Clean,
            },
            Tracking::Unknown { .. } => Glyph::Failed,
        }
    }
}

/// Run git against a repository, capturing output with a hard timeout.
/// Never errors: launch failures and timeouts come back as a failure tuple
/// (`code=1`, message in stderr) for callers to interpret, the same as any
/// ordinary non-zero exit.
pub fn run_git(repo: &Path, args: &[&str]) -> CmdOutput {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo).args(args);
    run_with_timeout(cmd, GIT_TIMEOUT)
}

fn run_with_timeout(mut cmd: Command, timeout: Duration) -> CmdOutput {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return CmdOutput::failure(format!("failed to run command: {e}")),
    };

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                return match child.wait_with_output() {
                    Ok(output) => CmdOutput {
                        code: output.status.code().unwrap_or(1),
                        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    },
                    Err(e) => CmdOutput::failure(format!("failed to collect git output: {e}")),
                };
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return CmdOutput::failure("timeout");
                }
                std::thread::sleep(TIMEOUT_POLL_INTERVAL);
            }
            Err(e) => return CmdOutput::failure(format!("failed waiting for git: {e}")),
        }
    }
}

/// Branch name for HEAD, or `@<short-hash>` when detached. Failure carries
/// the stderr of the last query so the caller can report why the repository
/// is unreadable.
fn current_branch(repo: &Path) -> Result<String, String> {
    let out = run_git(repo, &["symbolic-ref", "--quiet", "--short", "HEAD"]);
    if out.ok() && !out.stdout.is_empty() {
        return Ok(out.stdout);
    }
    // Detached HEAD: label with the short commit hash.
    let out = run_git(repo, &["rev-parse", "--short", "HEAD"]);
    if out.ok() && !out.stdout.is_empty() {
        return Ok(format!("@{}", out.stdout));
    }
    Err(if out.stderr.is_empty() {
        "unable to read repository".to_string()
    } else {
        out.stderr
    })
}

fn upstream_name(repo: &Path) -> Option<String> {
    // A missing upstream is a normal non-error outcome here.
    let out = run_git(
        repo,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    );
    if out.ok() && !out.stdout.is_empty() {
        Some(out.stdout)
    } else {
        None
    }
}

fn ahead_behind(repo: &Path) -> Result<(usize, usize), String> {
    let out = run_git(repo, &["rev-list", "--left-right", "--count", "HEAD...@{u}"]);
    if !out.ok() || out.stdout.is_empty() {
        return Err(if out.stderr.is_empty() {
            "unable to compute ahead/behind".to_string()
        } else {
            out.stderr
        });
    }
    parse_ahead_behind(&out.stdout)
}

fn parse_ahead_behind(s: &str) -> Result<(usize, usize), String> {
    let mut parts = s.split_whitespace();
    let ahead = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| format!("unparseable rev-list output: {s:?}"))?;
    let behind = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| format!("unparseable rev-list output: {s:?}"))?;
    Ok((ahead, behind))
}

fn working_tree_counts(repo: &Path) -> (usize, usize) {
    let out = run_git(repo, &["status", "--porcelain"]);
    if !out.ok() {
        return (0, 0);
    }
    let mut dirty = 0;
    let mut untracked = 0;
    for line in out.stdout.lines() {
        if line.starts_with("??") {
            untracked += 1;
        } else if !line.trim().is_empty() {
            dirty += 1;
        }
    }
    (dirty, untracked)
}

fn stash_count(repo: &Path) -> usize {
    let out = run_git(repo, &["stash", "list"]);
    if !out.ok() {
        return 0;
    }
    out.stdout.lines().filter(|l| !l.trim().is_empty()).count()
}

fn fetch_all(repo: &Path) -> Option<String> {
    let out = run_git(repo, &["fetch", "--all", "--quiet"]);
    if out.ok() {
        None
    } else if out.stderr.is_empty() {
        Some("git fetch failed".to_string())
    } else {
        Some(out.stderr)
    }
}

/// Collect the full status of one repository. Each step degrades on its own:
/// a failed query leaves its field at the default instead of aborting the
/// record. Only "cannot even determine HEAD" marks the repo unavailable.
pub fn collect_status(path: &Path, do_fetch: bool) -> RepoStatus {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let branch = match current_branch(path) {
        Ok(branch) => branch,
        Err(reason) => {
            warn!(repo = %path.display(), %reason, "repository unavailable");
            return RepoStatus {
                name,
                path: path.to_path_buf(),
                state: RepoState::Unavailable { reason },
                updated_at: SystemTime::now(),
            };
        }
    };

    let fetch_error = if do_fetch { fetch_all(path) } else { None };
    if let Some(err) = &fetch_error {
        warn!(repo = %name, error = %err, "fetch failed");
    }

    let tracking = match upstream_name(path) {
        None => Tracking::None,
        Some(upstream) => match ahead_behind(path) {
            Ok((ahead, behind)) => Tracking::Known {
                upstream,
                ahead,
                behind,
            },
            Err(error) => {
                warn!(repo = %name, %error, "ahead/behind query failed");
                Tracking::Unknown { upstream, error }
            }
        },
    };

    let (dirty, untracked) = working_tree_counts(path);
    let stashes = stash_count(path);
    debug!(repo = %name, %branch, dirty, untracked, stashes, "collected status");

    RepoStatus {
        name,
        path: path.to_path_buf(),
        state: RepoState::Available(SyncInfo {
            branch,
            tracking,
            dirty,
            untracked,
            stashes,
            fetch_error,
        }),
        updated_at: SystemTime::now(),
    }
}

/// Collect every non-ignored repository and rank the results: repositories
/// needing attention first, ties broken by name, case-insensitively. The
/// returned vector is swapped into the app state as one atomic snapshot, so
/// per-repo collection is free to run in parallel.
pub fn aggregate(paths: &[PathBuf], config: &Config, do_fetch: bool) -> Vec<RepoStatus> {
    let mut statuses: Vec<RepoStatus> = paths
        .par_iter()
        .filter(|p| {
            let name = p.file_name().unwrap_or_default().to_string_lossy();
            !config.ignore_repos.iter().any(|ig| ig == name.as_ref())
        })
        .map(|p| collect_status(p, do_fetch))
        .collect();
    sort_statuses(&mut statuses);
    statuses
}

pub fn sort_statuses(statuses: &mut [RepoStatus]) {
    statuses.sort_by_key(|s| (!s.needs_attention(), s.name.to_lowercase()));
}
