//! Shared helpers for command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ai_config::Config;
use ai_core::AppError;
use ai_github::IssueFilter;

/// Resolve and load the config: explicit `--config` path, otherwise
/// `autoissue.toml` in `--cd` (or the current directory).
pub(crate) fn load_config(config: Option<PathBuf>, cd: Option<PathBuf>) -> Result<Config> {
    let path = match config {
        Some(path) => path,
        None => {
            let dir = match cd {
                Some(dir) => dir,
                None => std::env::current_dir().context("Failed to determine current directory")?,
            };
            Config::default_path(&dir)
        }
    };
    Config::load(&path)
}

/// Turn `--label` / `--issues` into an issue filter. Exactly one of the two
/// must be given.
pub(crate) fn build_filter(label: Option<String>, issues: Vec<u64>) -> Result<IssueFilter> {
    match (label, issues.is_empty()) {
        (Some(label), _) => Ok(IssueFilter::Label(label)),
        (None, false) => Ok(IssueFilter::Numbers(issues)),
        (None, true) => {
            Err(AppError::Config("either --label or --issues is required".to_string()).into())
        }
    }
}
