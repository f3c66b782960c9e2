//! Config bounds checking. Violations surface as `AppError::Config` so the
//! binary can map them to the startup-error exit code.

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use ai_core::AppError;

use crate::config::Config;

fn repo_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Exactly one '/', non-empty on both sides.
    RE.get_or_init(|| Regex::new(r"^[^/]+/[^/]+$").unwrap_or_else(|e| unreachable!("{e}")))
}

impl Config {
    /// Enforce every documented bound. Called by [`Config::load`]; callers
    /// constructing a config programmatically should call this themselves.
    pub fn validate(&self) -> Result<()> {
        self.validate_project()?;
        self.validate_executor()?;
        self.validate_agent()?;
        self.validate_budget()?;
        Ok(())
    }

    fn validate_project(&self) -> Result<()> {
        if !repo_pattern().is_match(&self.project.repo) {
            return Err(config_error(format!(
                "project.repo must be 'owner/name' (got '{}')",
                self.project.repo
            )));
        }
        if !self.project.path.is_absolute() {
            return Err(config_error(format!(
                "project.path must be absolute (got '{}')",
                self.project.path.display()
            )));
        }
        if self.project.base_branch.is_empty() {
            return Err(config_error("project.base_branch cannot be empty".into()));
        }
        Ok(())
    }

    fn validate_executor(&self) -> Result<()> {
        if !(1..=10).contains(&self.executor.max_parallel) {
            return Err(config_error(format!(
                "executor.max_parallel must be in 1..=10 (got {})",
                self.executor.max_parallel
            )));
        }
        if !(5..=120).contains(&self.executor.timeout_minutes) {
            return Err(config_error(format!(
                "executor.timeout_minutes must be in 5..=120 (got {})",
                self.executor.timeout_minutes
            )));
        }
        Ok(())
    }

    fn validate_agent(&self) -> Result<()> {
        if !self.agent.max_budget_usd.is_finite() || self.agent.max_budget_usd < 0.01 {
            return Err(config_error(format!(
                "agent.max_budget_usd must be >= 0.01 (got {})",
                self.agent.max_budget_usd
            )));
        }
        if self.agent.max_turns == Some(0) {
            return Err(config_error("agent.max_turns must be > 0".into()));
        }
        Ok(())
    }

    fn validate_budget(&self) -> Result<()> {
        if !self.max_total_budget_usd.is_finite() || self.max_total_budget_usd <= 0.0 {
            return Err(config_error(format!(
                "max_total_budget_usd must be positive (got {})",
                self.max_total_budget_usd
            )));
        }
        Ok(())
    }
}

fn config_error(message: String) -> anyhow::Error {
    AppError::Config(message).into()
}
