//! Claude CLI agent runner.
//!
//! Invokes the `claude` binary in print mode with JSON output and parses
//! the final result object for cost, duration, and the provider session ID.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::process::{check_tool_installed, clip_line, run_with_timeout, tail_line};
use crate::runner::{AgentFailure, AgentOutcome, AgentRequest, AgentRunner};

const CLAUDE_BIN: &str = "claude";

/// Environment variables stripped from the child process.
///
/// Claude Code sets these to detect recursive invocations; a child that
/// inherits them refuses to start.
const STRIPPED_ENV_VARS: &[&str] = &["CLAUDECODE", "CLAUDE_CODE_ENTRYPOINT"];

/// Result object emitted by `claude --output-format json`.
#[derive(Debug, Default, Deserialize)]
struct ClaudeResult {
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    total_cost_usd: f64,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

/// Runs tasks through the Claude CLI.
#[derive(Debug, Default)]
pub struct ClaudeAgent;

impl ClaudeAgent {
    fn build_command(&self, request: &AgentRequest) -> Command {
        let mut cmd = Command::new(CLAUDE_BIN);
        cmd.current_dir(&request.cwd);
        for var in STRIPPED_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.arg("--dangerously-skip-permissions");
        cmd.arg("--output-format").arg("json");
        cmd.arg("--model").arg(request.model.as_str());
        cmd.arg("--max-turns").arg(request.max_turns.to_string());
        cmd.arg("--append-system-prompt").arg(&request.system_prompt);
        cmd.arg("-p").arg(&request.user_prompt);
        cmd
    }
}

#[async_trait::async_trait]
impl AgentRunner for ClaudeAgent {
    #[tracing::instrument(skip_all, fields(cwd = %request.cwd.display(), model = %request.model))]
    async fn run(&self, request: &AgentRequest) -> Result<AgentOutcome> {
        check_tool_installed(CLAUDE_BIN).await?;

        let started = Instant::now();
        let result = run_with_timeout(self.build_command(request), request.timeout).await?;

        if result.timed_out {
            return Ok(AgentOutcome {
                success: false,
                cost_usd: 0.0,
                duration: started.elapsed(),
                session_id: None,
                failure: Some(AgentFailure::Timeout),
                summary: format!("timed out after {}s", request.timeout.as_secs()),
            });
        }

        let parsed = parse_result(&result.stdout);
        let cost_usd = parsed.total_cost_usd;
        let duration = if parsed.duration_ms > 0 {
            Duration::from_millis(parsed.duration_ms)
        } else {
            started.elapsed()
        };

        if result.exit_code != 0 || parsed.is_error {
            let summary = crash_summary(&result.stdout, &result.stderr, result.exit_code);
            warn!(exit_code = result.exit_code, %summary, "agent run failed");
            return Ok(AgentOutcome {
                success: false,
                cost_usd,
                duration,
                session_id: parsed.session_id,
                failure: Some(AgentFailure::Crashed),
                summary,
            });
        }

        if cost_usd > request.max_budget_usd {
            warn!(cost_usd, max_budget_usd = request.max_budget_usd, "agent exceeded per-task budget");
            return Ok(AgentOutcome {
                success: false,
                cost_usd,
                duration,
                session_id: parsed.session_id,
                failure: Some(AgentFailure::BudgetExceeded),
                summary: format!(
                    "spent ${cost_usd:.2} of ${:.2} per-task budget",
                    request.max_budget_usd
                ),
            });
        }

        debug!(cost_usd, duration_ms = duration.as_millis() as u64, "agent run succeeded");
        Ok(AgentOutcome {
            success: true,
            cost_usd,
            duration,
            session_id: parsed.session_id,
            failure: None,
            summary: parsed
                .result
                .as_deref()
                .map(|r| clip_line(tail_line(r), 200))
                .unwrap_or_else(|| "agent completed".to_string()),
        })
    }
}

/// Parse the CLI's result JSON. The object is normally the whole stdout;
/// fall back to scanning lines from the end so stray diagnostics before
/// the JSON do not break parsing.
fn parse_result(stdout: &str) -> ClaudeResult {
    if let Ok(parsed) = serde_json::from_str::<ClaudeResult>(stdout.trim()) {
        return parsed;
    }
    for line in stdout.lines().rev() {
        let line = line.trim();
        if line.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<ClaudeResult>(line) {
                return parsed;
            }
        }
    }
    warn!("could not parse agent result JSON, treating cost/duration as unknown");
    ClaudeResult::default()
}

/// One-line failure summary: stdout tail, then stderr tail, then the code.
fn crash_summary(stdout: &str, stderr: &str, exit_code: i32) -> String {
    [tail_line(stdout), tail_line(stderr)]
        .into_iter()
        .find(|line| !line.is_empty())
        .map(|line| clip_line(line, 200))
        .unwrap_or_else(|| format!("exit code {exit_code}"))
}
