//! Worktree creation and guaranteed teardown.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use tracing::{debug, info, warn};

use ai_core::AppError;

use crate::branch::sanitize_branch_name;
use crate::git::run_git;

/// Creates isolated checkouts under `<repo_root>/.worktrees/`, each on a
/// fresh branch forked from the base branch.
#[derive(Debug)]
pub struct WorktreeManager {
    repo_root: PathBuf,
    base_branch: String,
    // Positive-result memoization for exists_cached(): a path seen once
    // during a session does not get stat'd again.
    exists_cache: Mutex<HashSet<PathBuf>>,
}

impl WorktreeManager {
    pub fn new(repo_root: impl Into<PathBuf>, base_branch: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            base_branch: base_branch.into(),
            exists_cache: Mutex::new(HashSet::new()),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    /// Create a worktree on a new branch forked from the base branch.
    ///
    /// Atomic: when branch or checkout creation fails partway, the partial
    /// state is rolled back before the error is reported. Fails if the
    /// target path already exists; the error carries the path and the
    /// `git worktree prune` recovery hint.
    pub fn create(&self, branch_name: &str) -> Result<Worktree> {
        let branch = sanitize_branch_name(branch_name)?;
        let path = self.repo_root.join(".worktrees").join(&branch);

        if path.exists() {
            return Err(AppError::Worktree {
                path,
                message: "target path already exists".to_string(),
            }
            .into());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Worktree {
                path: parent.to_path_buf(),
                message: format!("failed to create worktrees directory: {e}"),
            })?;
        }

        let path_str = path.to_string_lossy().to_string();
        let result = run_git(
            &self.repo_root,
            &["worktree", "add", &path_str, "-b", &branch, &self.base_branch],
        );

        if let Err(e) = result {
            self.rollback_partial(&path, &branch);
            return Err(AppError::Worktree {
                path,
                message: e.to_string(),
            }
            .into());
        }

        info!(branch = %branch, path = %path.display(), "worktree created");
        Ok(Worktree {
            repo_root: self.repo_root.clone(),
            branch,
            path,
            keep_branch: false,
            cleaned_up: false,
        })
    }

    /// Best-effort removal of whatever a failed create left behind.
    fn rollback_partial(&self, path: &Path, branch: &str) {
        let path_str = path.to_string_lossy().to_string();
        if let Err(e) = run_git(&self.repo_root, &["worktree", "remove", "--force", &path_str]) {
            debug!(error = %e, "rollback: worktree remove (may not exist)");
        }
        if let Err(e) = run_git(&self.repo_root, &["branch", "-D", branch]) {
            debug!(error = %e, "rollback: branch delete (may not exist)");
        }
        if path.exists() {
            if let Err(e) = std::fs::remove_dir_all(path) {
                warn!(path = %path.display(), error = %e, "rollback: could not remove directory");
            }
        }
    }

    /// Read-only existence check.
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Existence check with positive-result memoization, for repeated
    /// probes during scheduling passes.
    pub fn exists_cached(&self, path: &Path) -> bool {
        let mut cache = self
            .exists_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if cache.contains(path) {
            return true;
        }
        let found = path.exists();
        if found {
            cache.insert(path.to_path_buf());
        }
        found
    }
}

/// A live checkout owned by exactly one task runner.
///
/// Cleanup runs on every exit path: explicitly via [`Worktree::cleanup`] or
/// implicitly on Drop (success, failure, timeout, cancellation). Repeated
/// invocations are no-ops; errors are logged, never raised, so a cleanup
/// problem cannot mask the task's own outcome.
#[derive(Debug)]
pub struct Worktree {
    repo_root: PathBuf,
    branch: String,
    path: PathBuf,
    keep_branch: bool,
    cleaned_up: bool,
}

impl Worktree {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Preserve the local branch when the worktree is released. Used when a
    /// branch was pushed but PR creation failed, so the work stays
    /// recoverable.
    pub fn keep_branch(&mut self) {
        self.keep_branch = true;
    }

    /// Remove the worktree (and, unless [`keep_branch`] was called, its
    /// branch). Idempotent.
    ///
    /// [`keep_branch`]: Worktree::keep_branch
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;

        let path_str = self.path.to_string_lossy().to_string();
        match run_git(&self.repo_root, &["worktree", "remove", "--force", &path_str]) {
            Ok(_) => debug!(path = %self.path.display(), "worktree removed"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "worktree removal failed"),
        }

        if self.keep_branch {
            info!(branch = %self.branch, "keeping branch for manual recovery");
            return;
        }
        match run_git(&self.repo_root, &["branch", "-D", &self.branch]) {
            Ok(_) => debug!(branch = %self.branch, "branch deleted"),
            Err(e) => warn!(branch = %self.branch, error = %e, "branch deletion failed"),
        }
    }
}

impl Drop for Worktree {
    fn drop(&mut self) {
        self.cleanup();
    }
}
