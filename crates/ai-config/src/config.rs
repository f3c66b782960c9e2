use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ai_core::AgentModel;

pub const CONFIG_FILE_NAME: &str = "autoissue.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    /// Cumulative spend ceiling for the whole session, in USD.
    #[serde(default = "default_max_total_budget")]
    pub max_total_budget_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// `owner/name` on the source-control host.
    pub repo: String,
    /// Absolute path to the local checkout.
    pub path: PathBuf,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default = "default_true")]
    pub create_pr: bool,
    #[serde(default)]
    pub pr_draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: AgentModel,
    /// Per-task spend ceiling, enforced by the agent runner.
    #[serde(default = "default_max_budget")]
    pub max_budget_usd: f64,
    /// Defaults by model when unset (opus 5, sonnet 8, haiku 12).
    #[serde(default)]
    pub max_turns: Option<u32>,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_max_parallel() -> usize {
    3
}

fn default_timeout_minutes() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_model() -> AgentModel {
    AgentModel::Sonnet
}

fn default_max_budget() -> f64 {
    5.0
}

fn default_max_total_budget() -> f64 {
    50.0
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            timeout_minutes: default_timeout_minutes(),
            create_pr: true,
            pr_draft: false,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_budget_usd: default_max_budget(),
            max_turns: None,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config location inside a checkout.
    pub fn default_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE_NAME)
    }

    /// Per-agent-run hard timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.executor.timeout_minutes * 60)
    }

    /// Configured turn cap, or the model's default.
    pub fn effective_max_turns(&self) -> u32 {
        self.agent
            .max_turns
            .unwrap_or_else(|| self.agent.model.default_max_turns())
    }

    /// The snapshot persisted into session state.
    pub fn snapshot(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context("Failed to snapshot config")
    }
}
