//! Git plumbing shared by the worktree manager and the executor.
//!
//! All operations shell out to the `git` binary; callers get stderr in the
//! error message when a command fails.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// Run a git command in `dir` and return its stdout.
pub(crate) fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Whether the checkout has uncommitted modifications (staged or not).
pub fn has_uncommitted_changes(worktree: &Path) -> Result<bool> {
    let status = run_git(worktree, &["status", "--porcelain"])?;
    Ok(!status.trim().is_empty())
}

/// Number of commits on HEAD that are not on `base_branch`.
pub fn commits_ahead(worktree: &Path, base_branch: &str) -> Result<u32> {
    let range = format!("{base_branch}..HEAD");
    let count = run_git(worktree, &["rev-list", "--count", &range])?;
    count
        .trim()
        .parse()
        .with_context(|| format!("Unexpected rev-list output: {count:?}"))
}

/// Whether the agent produced anything: commits on the branch or
/// uncommitted modifications in the working directory.
pub fn has_changes(worktree: &Path, base_branch: &str) -> Result<bool> {
    Ok(has_uncommitted_changes(worktree)? || commits_ahead(worktree, base_branch)? > 0)
}

/// Stage everything and commit. A clean tree is not an error — agents often
/// commit their own work and leave nothing behind.
pub fn commit_all(worktree: &Path, message: &str) -> Result<()> {
    run_git(worktree, &["add", "-A"])?;

    if !index_has_changes(worktree)? {
        return Ok(());
    }
    run_git(worktree, &["commit", "-m", message])?;
    Ok(())
}

/// Whether anything is staged. Probes with `diff --cached --quiet`, whose
/// exit status encodes the answer (0 clean, 1 dirty).
fn index_has_changes(worktree: &Path) -> Result<bool> {
    let probe = Command::new("git")
        .args(["diff", "--cached", "--quiet"])
        .current_dir(worktree)
        .output()
        .context("Failed to run git diff --cached")?;

    match probe.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        other => bail!(
            "git diff --cached did not report cleanly (status {other:?}): {}",
            String::from_utf8_lossy(&probe.stderr).trim()
        ),
    }
}

/// Push the branch to origin, creating the upstream.
pub fn push(worktree: &Path, branch: &str) -> Result<()> {
    run_git(worktree, &["push", "--set-upstream", "origin", branch])?;
    Ok(())
}
