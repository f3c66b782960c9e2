//! The coordinator: session setup, admission loop, checkpointing, shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use ai_agent::AgentRunner;
use ai_classifier::classify;
use ai_config::Config;
use ai_core::{AppError, IssueState, Task};
use ai_github::{IssueFilter, IssueSource, SourceControlHost};
use ai_scheduler::Scheduler;
use ai_session::{SessionLock, SessionState, SessionStore, new_session_id};
use ai_worktree::WorktreeManager;

use crate::report::{RunReport, RunStatus};
use crate::task_runner::{TaskContext, TaskOutcome, run_task};

/// Per-invocation knobs, on top of the loaded config.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub filter: IssueFilter,
    /// Resume an existing session by ID instead of starting fresh.
    pub resume: Option<String>,
    /// Substitute the deterministic agent stub and skip PR creation.
    pub dry_run: bool,
}

/// Owns the scheduler, the session state, and the cumulative budget.
/// Workers only ever hand back [`TaskOutcome`] values.
pub struct Executor {
    config: Config,
    store: SessionStore,
    issues: Arc<dyn IssueSource>,
    agent: Arc<dyn AgentRunner>,
    host: Arc<dyn SourceControlHost>,
}

impl Executor {
    pub fn new(
        config: Config,
        store: SessionStore,
        issues: Arc<dyn IssueSource>,
        agent: Arc<dyn AgentRunner>,
        host: Arc<dyn SourceControlHost>,
    ) -> Self {
        Self {
            config,
            store,
            issues,
            agent,
            host,
        }
    }

    /// Run the whole batch: fetch, classify, schedule, execute, checkpoint.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, options: ExecutorOptions) -> Result<RunReport> {
        let mut session = self.load_or_create_session(options.resume.as_deref())?;
        let _lock = SessionLock::acquire(&self.store, &session.session_id, "executor run")?;

        let issues = self.issues.fetch_issues(&options.filter).await?;

        let mut scheduler = Scheduler::new(self.config.executor.max_parallel)?;
        let mut skipped_resumed = 0usize;
        for issue in &issues {
            if issue.state != IssueState::Open {
                info!(issue = issue.number, "skipping closed issue");
                continue;
            }
            if session.is_finished(issue.number) {
                debug!(issue = issue.number, "already finished in this session");
                skipped_resumed += 1;
                continue;
            }
            let classification = classify(issue);
            info!(
                issue = issue.number,
                domain = %classification.domain,
                confidence = classification.confidence,
                "classified"
            );
            for reason in &classification.reasons {
                debug!(issue = issue.number, %reason, "classification evidence");
            }
            scheduler.enqueue(Task::from_issue(issue, classification.domain));
        }

        info!(
            session_id = %session.session_id,
            queued = scheduler.status().queued,
            skipped_resumed,
            dry_run = options.dry_run,
            "session ready"
        );
        self.store.save(&mut session)?;

        let ctx = TaskContext {
            manager: Arc::new(WorktreeManager::new(
                self.config.project.path.clone(),
                self.config.project.base_branch.clone(),
            )),
            agent: Arc::clone(&self.agent),
            host: Arc::clone(&self.host),
            model: self.config.agent.model,
            max_budget_usd: self.config.agent.max_budget_usd,
            max_turns: self.config.effective_max_turns(),
            timeout: self.config.timeout(),
            base_branch: self.config.project.base_branch.clone(),
            create_pr: self.config.executor.create_pr,
            pr_draft: self.config.executor.pr_draft,
            dry_run: options.dry_run,
        };

        let mut join_set: JoinSet<TaskOutcome> = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, u64> = HashMap::new();
        let mut budget_exhausted = false;
        let mut interrupted = false;

        while scheduler.has_work() {
            if !budget_exhausted
                && !interrupted
                && session.total_cost_usd >= self.config.max_total_budget_usd
            {
                let err = AppError::BudgetExhausted {
                    spent: session.total_cost_usd,
                    limit: self.config.max_total_budget_usd,
                };
                warn!(%err, unrun = scheduler.status().queued, "stopping admission");
                budget_exhausted = true;
            }

            if budget_exhausted || interrupted {
                // No new admissions; drain in-flight workers, then stop.
                if join_set.is_empty() {
                    break;
                }
            } else {
                for task in scheduler.fill_slots() {
                    let handle = join_set.spawn(run_task(ctx.clone(), task.clone()));
                    in_flight.insert(handle.id(), task.issue_number);
                }
                if join_set.is_empty() {
                    // has_work() said yes, nothing is running, and the
                    // admission pass found nothing admissible. A task with
                    // an empty running set is always admissible, so this is
                    // a scheduler bug, not an operational state.
                    self.store.save(&mut session)?;
                    bail!(
                        "admission stalled: {} queued tasks, none admissible with no tasks running",
                        scheduler.status().queued
                    );
                }
                for blocked in scheduler.block_reasons() {
                    for reason in &blocked.reasons {
                        debug!(issue = blocked.issue_number, %reason, "waiting");
                    }
                }
            }

            tokio::select! {
                joined = join_set.join_next_with_id() => {
                    let Some(joined) = joined else { continue };
                    let outcome = match joined {
                        Ok((id, outcome)) => {
                            in_flight.remove(&id);
                            outcome
                        }
                        Err(join_error) => {
                            // A worker died without reporting: aborted on
                            // interrupt, or panicked. Synthesize a failure
                            // so the task is never silently lost.
                            let Some(issue_number) = in_flight.remove(&join_error.id()) else {
                                error!(error = %join_error, "worker finished with no in-flight record");
                                continue;
                            };
                            let message = if join_error.is_cancelled() {
                                "cancelled by interrupt".to_string()
                            } else {
                                error!(issue = issue_number, error = %join_error, "worker panicked");
                                "worker panicked".to_string()
                            };
                            TaskOutcome {
                                issue_number,
                                success: false,
                                cost_usd: 0.0,
                                pr_url: None,
                                error: Some(message),
                            }
                        }
                    };

                    scheduler.complete(outcome.issue_number, outcome.success);
                    session.add_cost(outcome.cost_usd);
                    if outcome.success {
                        session.record_completed(outcome.issue_number);
                    } else {
                        session.record_failed(outcome.issue_number);
                    }
                    if let Err(e) = self.store.save(&mut session) {
                        error!(error = %format!("{e:#}"), "checkpoint write failed");
                    }

                    let st = scheduler.status();
                    info!(
                        issue = outcome.issue_number,
                        success = outcome.success,
                        cost_usd = outcome.cost_usd,
                        pr_url = outcome.pr_url.as_deref().unwrap_or(""),
                        completed = st.completed,
                        failed = st.failed,
                        running = st.running,
                        queued = st.queued,
                        total_cost_usd = session.total_cost_usd,
                        "task finished"
                    );
                }
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    warn!("interrupt received; cancelling in-flight tasks");
                    interrupted = true;
                    join_set.abort_all();
                }
            }
        }

        self.store.save(&mut session)?;

        let summary = scheduler.summary();
        let unrun = scheduler.status().queued;
        let status = if interrupted {
            RunStatus::Interrupted
        } else if budget_exhausted && unrun > 0 {
            RunStatus::BudgetExhausted
        } else if summary.failed > 0 {
            RunStatus::SomeFailed
        } else {
            RunStatus::AllCompleted
        };

        info!(
            ?status,
            completed = summary.completed,
            failed = summary.failed,
            unrun,
            total_cost_usd = session.total_cost_usd,
            "run finished"
        );

        Ok(RunReport {
            status,
            session_id: session.session_id.clone(),
            completed: summary.completed,
            failed: summary.failed,
            skipped_resumed,
            unrun,
            total_cost_usd: session.total_cost_usd,
            success_rate: summary.success_rate,
        })
    }

    fn load_or_create_session(&self, resume: Option<&str>) -> Result<SessionState> {
        match resume {
            Some(id) => {
                let session = self
                    .store
                    .load(id)
                    .with_context(|| format!("Cannot resume session '{id}'"))?;
                info!(
                    session_id = %id,
                    completed = session.completed_issue_numbers.len(),
                    failed = session.failed_issue_numbers.len(),
                    total_cost_usd = session.total_cost_usd,
                    "resuming session"
                );
                Ok(session)
            }
            None => {
                let session = SessionState::new(new_session_id(), self.config.snapshot()?);
                info!(session_id = %session.session_id, "starting new session");
                Ok(session)
            }
        }
    }
}
