//! The `run` command: wire up the real collaborators and drive the executor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use ai_agent::{AgentRunner, ClaudeAgent, DryRunAgent};
use ai_core::OutputFormat;
use ai_executor::{Executor, ExecutorOptions, RunReport};
use ai_github::{GhHost, GhIssueSource, IssueSource, SourceControlHost};
use ai_session::SessionStore;

use crate::common::{build_filter, load_config};

#[allow(clippy::too_many_arguments)]
pub(crate) async fn handle_run(
    label: Option<String>,
    issues: Vec<u64>,
    resume: Option<String>,
    dry_run: bool,
    config: Option<PathBuf>,
    cd: Option<PathBuf>,
    output_format: OutputFormat,
) -> Result<i32> {
    let config = load_config(config, cd)?;
    let filter = build_filter(label, issues)?;
    let store = SessionStore::new(SessionStore::default_root()?);

    let issue_source: Arc<dyn IssueSource> = Arc::new(GhIssueSource::new(&config.project.repo));
    let host: Arc<dyn SourceControlHost> = Arc::new(GhHost::new(&config.project.repo));
    let agent: Arc<dyn AgentRunner> = if dry_run {
        Arc::new(DryRunAgent)
    } else {
        Arc::new(ClaudeAgent)
    };

    let executor = Executor::new(config, store, issue_source, agent, host);
    let report = executor
        .run(ExecutorOptions {
            filter,
            resume,
            dry_run,
        })
        .await?;

    print_report(&report, &output_format)?;
    Ok(report.exit_code())
}

fn print_report(report: &RunReport, output_format: &OutputFormat) -> Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!();
            println!("=== Session {} ===", report.session_id);
            println!();
            println!("Completed: {}", report.completed);
            println!("Failed:    {}", report.failed);
            if report.skipped_resumed > 0 {
                println!("Skipped:   {} (already finished before resume)", report.skipped_resumed);
            }
            if report.unrun > 0 {
                println!("Unrun:     {}", report.unrun);
            }
            println!("Success rate: {:.0}%", report.success_rate);
            println!("Total cost:   ${:.2}", report.total_cost_usd);
        }
    }
    Ok(())
}
