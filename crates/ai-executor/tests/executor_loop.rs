//! End-to-end executor tests: fake issue source, scripted agent, fake PR
//! host, real git repository with a bare origin.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;

use ai_agent::{AgentFailure, AgentOutcome, AgentRequest, AgentRunner, DryRunAgent};
use ai_config::{AgentConfig, Config, ExecutorConfig, ProjectConfig};
use ai_core::{AgentModel, AppError, IssueRecord, IssueState};
use ai_executor::{Executor, ExecutorOptions, RunStatus};
use ai_github::{CreatedPr, IssueFilter, IssueSource, PullRequestParams, SourceControlHost};
use ai_session::{SessionLock, SessionState, SessionStore, new_session_id};

// ── Fixture plumbing ────────────────────────────────────────────────

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A project checkout with one commit on `main` and a bare `origin`.
struct Fixture {
    _root: tempfile::TempDir,
    project: PathBuf,
    origin: PathBuf,
    state_root: PathBuf,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().expect("tempdir");
    let project = root.path().join("project");
    let origin = root.path().join("origin.git");
    let state_root = root.path().join("state");
    std::fs::create_dir_all(&project).unwrap();

    git(root.path(), &["init", "--bare", origin.to_str().unwrap()]);
    git(&project, &["init", "-b", "main"]);
    git(&project, &["config", "user.email", "autoissue@localhost"]);
    git(&project, &["config", "user.name", "Autoissue Test"]);
    std::fs::write(project.join("README.md"), "seed\n").unwrap();
    git(&project, &["add", "."]);
    git(&project, &["commit", "-m", "init"]);
    git(&project, &["remote", "add", "origin", origin.to_str().unwrap()]);

    Fixture {
        _root: root,
        project,
        origin,
        state_root,
    }
}

fn config(fx: &Fixture, max_total_budget_usd: f64, create_pr: bool) -> Config {
    Config {
        project: ProjectConfig {
            repo: "acme/widgets".to_string(),
            path: fx.project.clone(),
            base_branch: "main".to_string(),
        },
        executor: ExecutorConfig {
            max_parallel: 3,
            timeout_minutes: 5,
            create_pr,
            pr_draft: false,
        },
        agent: AgentConfig {
            model: AgentModel::Sonnet,
            max_budget_usd: 5.0,
            max_turns: None,
        },
        max_total_budget_usd,
    }
}

fn issue(number: u64, title: &str) -> IssueRecord {
    let now = Utc::now();
    IssueRecord {
        number,
        title: title.to_string(),
        body: String::new(),
        labels: vec![],
        state: IssueState::Open,
        created_at: now,
        updated_at: now,
        url: format!("https://github.com/acme/widgets/issues/{number}"),
    }
}

struct FakeIssueSource {
    issues: Vec<IssueRecord>,
}

#[async_trait::async_trait]
impl IssueSource for FakeIssueSource {
    async fn fetch_issues(&self, _filter: &IssueFilter) -> Result<Vec<IssueRecord>> {
        Ok(self.issues.clone())
    }
}

/// Per-issue agent behavior, keyed off the issue number embedded in the
/// user prompt (`Resolve issue #N: ...`).
#[derive(Clone, Copy)]
enum Behavior {
    /// Write a file into the worktree and succeed.
    Write { cost: f64 },
    /// Succeed but leave the worktree untouched.
    NoChanges { cost: f64 },
    /// Report a crashed run.
    Fail { cost: f64 },
}

struct ScriptedAgent {
    default: Behavior,
    overrides: HashMap<u64, Behavior>,
}

impl ScriptedAgent {
    fn new(default: Behavior) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    fn with(mut self, issue_number: u64, behavior: Behavior) -> Self {
        self.overrides.insert(issue_number, behavior);
        self
    }
}

fn issue_of(prompt: &str) -> u64 {
    let digits: String = prompt
        .split('#')
        .nth(1)
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().expect("prompt must carry an issue number")
}

#[async_trait::async_trait]
impl AgentRunner for ScriptedAgent {
    async fn run(&self, request: &AgentRequest) -> Result<AgentOutcome> {
        let number = issue_of(&request.user_prompt);
        let behavior = self.overrides.get(&number).copied().unwrap_or(self.default);
        match behavior {
            Behavior::Write { cost } => {
                std::fs::write(
                    request.cwd.join(format!("issue-{number}.txt")),
                    "agent was here\n",
                )?;
                Ok(AgentOutcome {
                    success: true,
                    cost_usd: cost,
                    duration: std::time::Duration::from_millis(10),
                    session_id: Some(format!("agent-sess-{number}")),
                    failure: None,
                    summary: format!("resolved issue {number}"),
                })
            }
            Behavior::NoChanges { cost } => Ok(AgentOutcome {
                success: true,
                cost_usd: cost,
                duration: std::time::Duration::from_millis(10),
                session_id: None,
                failure: None,
                summary: "did nothing".to_string(),
            }),
            Behavior::Fail { cost } => Ok(AgentOutcome {
                success: false,
                cost_usd: cost,
                duration: std::time::Duration::from_millis(10),
                session_id: None,
                failure: Some(AgentFailure::Crashed),
                summary: "scripted failure".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct FakeHost {
    calls: Mutex<Vec<PullRequestParams>>,
}

#[async_trait::async_trait]
impl SourceControlHost for FakeHost {
    async fn create_pull_request(&self, params: &PullRequestParams) -> Result<CreatedPr> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(params.clone());
        Ok(CreatedPr {
            url: format!("https://github.com/acme/widgets/pull/{}", calls.len()),
        })
    }
}

struct FailingHost;

#[async_trait::async_trait]
impl SourceControlHost for FailingHost {
    async fn create_pull_request(&self, params: &PullRequestParams) -> Result<CreatedPr> {
        Err(AppError::PrCreation {
            branch: params.head_branch.clone(),
            message: "scripted PR failure".to_string(),
        }
        .into())
    }
}

fn executor(
    fx: &Fixture,
    config: Config,
    issues: Vec<IssueRecord>,
    agent: Arc<dyn AgentRunner>,
    host: Arc<dyn SourceControlHost>,
) -> Executor {
    Executor::new(
        config,
        SessionStore::new(&fx.state_root),
        Arc::new(FakeIssueSource { issues }),
        agent,
        host,
    )
}

fn run_options() -> ExecutorOptions {
    ExecutorOptions {
        filter: IssueFilter::Label("autoissue".to_string()),
        resume: None,
        dry_run: false,
    }
}

fn local_branch_exists(project: &Path, branch: &str) -> bool {
    !git_stdout(project, &["branch", "--list", branch]).trim().is_empty()
}

fn origin_branch_exists(origin: &Path, branch: &str) -> bool {
    let refname = format!("refs/heads/{branch}");
    !git_stdout(origin, &["for-each-ref", &refname]).trim().is_empty()
}

fn no_worktrees_left(project: &Path) -> bool {
    let dir = project.join(".worktrees");
    !dir.exists()
        || walk_files(&dir)
            .into_iter()
            .all(|p| p.is_dir())
}

fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(walk_files(&path));
            }
            out.push(path);
        }
    }
    out
}

// ── Dry run ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_dry_run_completes_every_task() {
    let fx = fixture();
    let host = Arc::new(FakeHost::default());
    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![
            issue(1, "[Backend] Add auth"),
            issue(2, "[Frontend] Fix modal"),
            issue(3, "Completely unclassifiable"),
        ],
        Arc::new(DryRunAgent),
        host.clone(),
    );

    let report = exec
        .run(ExecutorOptions {
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::AllCompleted);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.completed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total_cost_usd, 0.0);
    assert_eq!(report.success_rate, 100.0);

    // PR creation is skipped wholesale in dry runs.
    assert!(host.calls.lock().unwrap().is_empty());

    // Session state landed on disk with every issue recorded.
    let store = SessionStore::new(&fx.state_root);
    let session = store.load(&report.session_id).unwrap();
    assert_eq!(
        session.completed_issue_numbers.iter().copied().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(session.total_cost_usd, 0.0);

    assert!(no_worktrees_left(&fx.project));
}

// ── Real mode: commit, push, PR ─────────────────────────────────────

#[tokio::test]
async fn test_run_pushes_branch_and_creates_pr() {
    let fx = fixture();
    let host = Arc::new(FakeHost::default());
    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![issue(5, "[Backend] Add rate limiting")],
        Arc::new(ScriptedAgent::new(Behavior::Write { cost: 1.25 })),
        host.clone(),
    );

    let report = exec.run(run_options()).await.unwrap();

    assert_eq!(report.status, RunStatus::AllCompleted);
    assert_eq!(report.completed, 1);
    assert!((report.total_cost_usd - 1.25).abs() < 1e-9);

    let branch = "autoissue/issue-5-backend-add-rate-limiting";
    let calls = host.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].head_branch, branch);
    assert_eq!(calls[0].base_branch, "main");
    assert!(calls[0].title.contains("#5"));

    assert!(origin_branch_exists(&fx.origin, branch));
    // Worktree and its local branch are gone after a successful PR.
    assert!(no_worktrees_left(&fx.project));
    assert!(!local_branch_exists(&fx.project, branch));
}

#[tokio::test]
async fn test_create_pr_disabled_still_pushes() {
    let fx = fixture();
    let host = Arc::new(FakeHost::default());
    let exec = executor(
        &fx,
        config(&fx, 50.0, false),
        vec![issue(6, "[Docs] Update guide")],
        Arc::new(ScriptedAgent::new(Behavior::Write { cost: 0.5 })),
        host.clone(),
    );

    let report = exec.run(run_options()).await.unwrap();
    assert_eq!(report.status, RunStatus::AllCompleted);
    assert!(host.calls.lock().unwrap().is_empty());
    assert!(origin_branch_exists(&fx.origin, "autoissue/issue-6-docs-update-guide"));
}

// ── Failure modes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_agent_failure_marks_task_failed() {
    let fx = fixture();
    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![issue(7, "[Backend] Works"), issue(8, "[Frontend] Breaks")],
        Arc::new(
            ScriptedAgent::new(Behavior::Write { cost: 1.0 })
                .with(8, Behavior::Fail { cost: 0.75 }),
        ),
        Arc::new(FakeHost::default()),
    );

    let report = exec.run(run_options()).await.unwrap();

    assert_eq!(report.status, RunStatus::SomeFailed);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.success_rate, 50.0);
    // Cost is accounted even for failed runs.
    assert!((report.total_cost_usd - 1.75).abs() < 1e-9);

    let session = SessionStore::new(&fx.state_root).load(&report.session_id).unwrap();
    assert!(session.completed_issue_numbers.contains(&7));
    assert!(session.failed_issue_numbers.contains(&8));
    assert!(no_worktrees_left(&fx.project));
}

#[tokio::test]
async fn test_agent_producing_no_changes_fails_the_task() {
    let fx = fixture();
    let exec = executor(
        &fx,
        config(&fx, 50.0, false),
        vec![issue(9, "[Testing] Phantom work")],
        Arc::new(ScriptedAgent::new(Behavior::NoChanges { cost: 0.3 })),
        Arc::new(FakeHost::default()),
    );

    let report = exec.run(run_options()).await.unwrap();
    assert_eq!(report.status, RunStatus::SomeFailed);
    assert_eq!(report.failed, 1);
    assert!(no_worktrees_left(&fx.project));
}

#[tokio::test]
async fn test_pr_failure_still_counts_as_completed() {
    let fx = fixture();
    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![issue(10, "[Backend] Add webhooks")],
        Arc::new(ScriptedAgent::new(Behavior::Write { cost: 1.0 })),
        Arc::new(FailingHost),
    );

    let report = exec.run(run_options()).await.unwrap();

    // Agent-successful / PR-failed: scheduler counts it completed.
    assert_eq!(report.status, RunStatus::AllCompleted);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 0);

    let branch = "autoissue/issue-10-backend-add-webhooks";
    // Branch pushed and the local branch left intact for manual recovery.
    assert!(origin_branch_exists(&fx.origin, branch));
    assert!(local_branch_exists(&fx.project, branch));
    assert!(no_worktrees_left(&fx.project));
}

// ── Budget enforcement (scenario: two 6-dollar tasks, 10-dollar cap) ─

#[tokio::test]
async fn test_budget_cap_without_remaining_work_exits_zero() {
    let fx = fixture();
    let exec = executor(
        &fx,
        config(&fx, 10.0, true),
        vec![issue(1, "[Backend] First"), issue(2, "[Backend] Second")],
        Arc::new(ScriptedAgent::new(Behavior::NoChanges { cost: 6.0 })),
        Arc::new(FakeHost::default()),
    );

    // Same domain: the tasks run one after the other, each costing 6.
    let report = exec
        .run(ExecutorOptions {
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();

    assert_eq!(report.completed, 2);
    assert!((report.total_cost_usd - 12.0).abs() < 1e-9);
    // Over budget, but nothing was left unrun.
    assert_eq!(report.status, RunStatus::AllCompleted);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_budget_exhaustion_with_remaining_work_exits_two() {
    let fx = fixture();
    let exec = executor(
        &fx,
        config(&fx, 10.0, true),
        vec![
            issue(1, "[Backend] First"),
            issue(2, "[Backend] Second"),
            issue(3, "[Backend] Third"),
        ],
        Arc::new(ScriptedAgent::new(Behavior::NoChanges { cost: 6.0 })),
        Arc::new(FakeHost::default()),
    );

    let report = exec
        .run(ExecutorOptions {
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::BudgetExhausted);
    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.completed, 2);
    assert_eq!(report.unrun, 1);

    // The unrun task is absent from the session sets: resumable later.
    let session = SessionStore::new(&fx.state_root).load(&report.session_id).unwrap();
    assert!(!session.is_finished(3));
}

// ── Resume ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resume_skips_finished_issues() {
    let fx = fixture();
    let issues = vec![issue(1, "[Backend] A"), issue(2, "[Frontend] B")];

    let first = executor(
        &fx,
        config(&fx, 50.0, true),
        issues.clone(),
        Arc::new(DryRunAgent),
        Arc::new(FakeHost::default()),
    );
    let first_report = first
        .run(ExecutorOptions {
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();
    assert_eq!(first_report.completed, 2);

    let second = executor(
        &fx,
        config(&fx, 50.0, true),
        issues,
        Arc::new(DryRunAgent),
        Arc::new(FakeHost::default()),
    );
    let second_report = second
        .run(ExecutorOptions {
            resume: Some(first_report.session_id.clone()),
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();

    assert_eq!(second_report.session_id, first_report.session_id);
    assert_eq!(second_report.skipped_resumed, 2);
    assert_eq!(second_report.completed, 0);
    assert_eq!(second_report.status, RunStatus::AllCompleted);
}

#[tokio::test]
async fn test_resume_of_locked_session_fails_fast() {
    let fx = fixture();
    let store = SessionStore::new(&fx.state_root);
    let mut session = SessionState::new(new_session_id(), serde_json::json!({}));
    store.save(&mut session).unwrap();

    // Another process (simulated) is driving this session.
    let _held = SessionLock::acquire(&store, &session.session_id, "other run").unwrap();

    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![issue(1, "[Backend] A")],
        Arc::new(DryRunAgent),
        Arc::new(FakeHost::default()),
    );
    let err = exec
        .run(ExecutorOptions {
            resume: Some(session.session_id.clone()),
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap_err()
        .to_string();

    assert!(err.contains("already in use by process"), "{err}");
}

// ── Closed issues are skipped ───────────────────────────────────────

#[tokio::test]
async fn test_closed_issues_are_not_scheduled() {
    let fx = fixture();
    let mut closed = issue(11, "[Backend] Already done");
    closed.state = IssueState::Closed;

    let exec = executor(
        &fx,
        config(&fx, 50.0, true),
        vec![closed, issue(12, "[Frontend] Still open")],
        Arc::new(DryRunAgent),
        Arc::new(FakeHost::default()),
    );

    let report = exec
        .run(ExecutorOptions {
            dry_run: true,
            ..run_options()
        })
        .await
        .unwrap();

    assert_eq!(report.completed, 1);
    let session = SessionStore::new(&fx.state_root).load(&report.session_id).unwrap();
    assert!(!session.is_finished(11));
    assert!(session.completed_issue_numbers.contains(&12));
}
