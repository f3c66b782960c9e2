//! Isolated git worktree lifecycle for concurrent agent runs.
//!
//! Each task gets its own checkout under `<repo>/.worktrees/` on a fresh
//! branch forked from the base branch. Release is guaranteed: [`Worktree`]
//! cleans up on Drop, so every exit path — success, failure, timeout,
//! cancellation — tears the checkout down.

mod branch;
mod git;
mod manager;

pub use branch::{MAX_BRANCH_LEN, sanitize_branch_name, slugify_title};
pub use git::{commit_all, commits_ahead, has_changes, push};
pub use manager::{Worktree, WorktreeManager};
