//! Agent interface types and the dry-run stub.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use ai_core::AgentModel;

/// One agent invocation, bound to a task's worktree.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub cwd: PathBuf,
    pub model: AgentModel,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Per-task spend ceiling; overruns are reported as
    /// [`AgentFailure::BudgetExceeded`].
    pub max_budget_usd: f64,
    pub max_turns: u32,
    /// Hard wall-clock limit; the process group is killed on expiry.
    pub timeout: Duration,
}

/// How a run ended when it did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFailure {
    Timeout,
    Crashed,
    BudgetExceeded,
    /// The agent finished cleanly but left the worktree untouched.
    NoChanges,
}

impl std::fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Crashed => write!(f, "crashed"),
            Self::BudgetExceeded => write!(f, "budget exceeded"),
            Self::NoChanges => write!(f, "no changes produced"),
        }
    }
}

/// What an agent run reported back.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub success: bool,
    pub cost_usd: f64,
    pub duration: Duration,
    /// Provider-side session identifier, when the agent reported one.
    pub session_id: Option<String>,
    pub failure: Option<AgentFailure>,
    /// One line for progress logs.
    pub summary: String,
}

/// An external code-generation agent. Implementations must be cheap to
/// share across worker tasks.
#[async_trait::async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, request: &AgentRequest) -> Result<AgentOutcome>;
}

/// Deterministic stub for `--dry-run`: succeeds instantly at zero cost,
/// touching nothing.
#[derive(Debug, Default)]
pub struct DryRunAgent;

#[async_trait::async_trait]
impl AgentRunner for DryRunAgent {
    async fn run(&self, request: &AgentRequest) -> Result<AgentOutcome> {
        info!(cwd = %request.cwd.display(), model = %request.model, "dry run: skipping agent invocation");
        Ok(AgentOutcome {
            success: true,
            cost_usd: 0.0,
            duration: Duration::ZERO,
            session_id: None,
            failure: None,
            summary: "dry run (agent not invoked)".to_string(),
        })
    }
}
