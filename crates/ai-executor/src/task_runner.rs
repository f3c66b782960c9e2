//! The per-task worker: worktree, agent, commit/push/PR, guaranteed release.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use ai_agent::{AgentFailure, AgentRequest, AgentRunner};
use ai_core::{AgentModel, AppError, Task};
use ai_github::{PullRequestParams, SourceControlHost};
use ai_worktree::{WorktreeManager, commit_all, has_changes, push, slugify_title};

use crate::prompt;

/// Everything a worker needs, cloned per spawned task.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub manager: Arc<WorktreeManager>,
    pub agent: Arc<dyn AgentRunner>,
    pub host: Arc<dyn SourceControlHost>,
    pub model: AgentModel,
    pub max_budget_usd: f64,
    pub max_turns: u32,
    pub timeout: Duration,
    pub base_branch: String,
    pub create_pr: bool,
    pub pr_draft: bool,
    pub dry_run: bool,
}

/// What a worker reports back to the coordinator. Worker-scoped errors are
/// already folded into `success`/`error`; they never surface as panics.
#[derive(Debug)]
pub struct TaskOutcome {
    pub issue_number: u64,
    pub success: bool,
    pub cost_usd: f64,
    pub pr_url: Option<String>,
    pub error: Option<String>,
}

impl TaskOutcome {
    fn failed(issue_number: u64, cost_usd: f64, error: &anyhow::Error) -> Self {
        error!(issue = issue_number, error = %format!("{error:#}"), "task failed");
        Self {
            issue_number,
            success: false,
            cost_usd,
            pr_url: None,
            error: Some(format!("{error:#}")),
        }
    }
}

/// Branch name for a task: `autoissue/issue-<N>-<slug>`.
pub(crate) fn branch_name(task: &Task) -> String {
    let slug = slugify_title(&task.title);
    if slug.is_empty() {
        format!("autoissue/issue-{}", task.issue_number)
    } else {
        format!("autoissue/issue-{}-{}", task.issue_number, slug)
    }
}

/// Run one task to completion. Never returns an error: every failure mode
/// becomes a failed [`TaskOutcome`]. The worktree is released on all paths
/// (explicitly here, by Drop if this future is cancelled).
#[tracing::instrument(skip_all, fields(issue = task.issue_number, domain = %task.domain))]
pub(crate) async fn run_task(ctx: TaskContext, task: Task) -> TaskOutcome {
    let issue_number = task.issue_number;
    let branch = branch_name(&task);

    let mut worktree = match ctx.manager.create(&branch) {
        Ok(worktree) => worktree,
        Err(e) => return TaskOutcome::failed(issue_number, 0.0, &e),
    };
    info!(branch = %branch, path = %worktree.path().display(), "worktree ready");

    let request = AgentRequest {
        cwd: worktree.path().to_path_buf(),
        model: ctx.model,
        system_prompt: prompt::system_prompt(),
        user_prompt: prompt::user_prompt(&task),
        max_budget_usd: ctx.max_budget_usd,
        max_turns: ctx.max_turns,
        timeout: ctx.timeout,
    };

    let outcome = match ctx.agent.run(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = AppError::Agent {
                issue: issue_number,
                message: format!("{e:#}"),
            }
            .into();
            worktree.cleanup();
            return TaskOutcome::failed(issue_number, 0.0, &err);
        }
    };

    if !outcome.success {
        let failure = outcome.failure.unwrap_or(AgentFailure::Crashed);
        let err = AppError::Agent {
            issue: issue_number,
            message: format!("{failure}: {}", outcome.summary),
        }
        .into();
        worktree.cleanup();
        return TaskOutcome::failed(issue_number, outcome.cost_usd, &err);
    }

    // Dry run stops here: the stub agent touched nothing, and PR creation
    // is skipped by definition.
    if ctx.dry_run {
        worktree.cleanup();
        return TaskOutcome {
            issue_number,
            success: true,
            cost_usd: outcome.cost_usd,
            pr_url: None,
            error: None,
        };
    }

    let produced_changes = match has_changes(worktree.path(), &ctx.base_branch) {
        Ok(produced) => produced,
        Err(e) => {
            worktree.cleanup();
            return TaskOutcome::failed(issue_number, outcome.cost_usd, &e);
        }
    };
    if !produced_changes {
        let err = AppError::Agent {
            issue: issue_number,
            message: AgentFailure::NoChanges.to_string(),
        }
        .into();
        worktree.cleanup();
        return TaskOutcome::failed(issue_number, outcome.cost_usd, &err);
    }

    // Commit whatever the agent left uncommitted, then publish the branch.
    let commit_message = format!("Resolve #{issue_number}: {}", task.title);
    if let Err(e) = commit_all(worktree.path(), &commit_message) {
        worktree.cleanup();
        return TaskOutcome::failed(issue_number, outcome.cost_usd, &e);
    }
    if let Err(e) = push(worktree.path(), &branch) {
        // The work exists only locally; keep the branch so it stays
        // recoverable.
        worktree.keep_branch();
        worktree.cleanup();
        return TaskOutcome::failed(issue_number, outcome.cost_usd, &e);
    }

    let pr_url = if ctx.create_pr {
        let params = PullRequestParams {
            base_branch: ctx.base_branch.clone(),
            head_branch: branch.clone(),
            title: format!("[autoissue] #{issue_number}: {}", task.title),
            body: format!("Closes #{issue_number}.\n\n{}", outcome.summary),
            draft: ctx.pr_draft,
        };
        match ctx.host.create_pull_request(&params).await {
            Ok(pr) => {
                info!(issue = issue_number, url = %pr.url, "pull request created");
                Some(pr.url)
            }
            Err(e) => {
                // Agent-successful / PR-failed: the task still counts as
                // completed, the branch stays for manual recovery.
                warn!(issue = issue_number, branch = %branch, error = %format!("{e:#}"),
                      "PR creation failed; branch left intact");
                worktree.keep_branch();
                None
            }
        }
    } else {
        None
    };

    worktree.cleanup();
    TaskOutcome {
        issue_number,
        success: true,
        cost_usd: outcome.cost_usd,
        pr_url,
        error: None,
    }
}
